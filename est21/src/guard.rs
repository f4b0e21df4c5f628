//!
//! # Incremental Parasitics Guard
//!
//! Scoped incremental mode: design edits made through the guard
//! mark nets stale, and stale nets are re-estimated on [IncrementalParasiticsGuard::update]
//! and once more when the guard is dropped.
//!

// Local imports
use crate::design::{Block, Database};
use crate::{EstError, EstResult, Estimator, ParasiticsSrc};

///
/// # Incremental Parasitics Guard
///
/// Holds the [Estimator] and [Database] for the length of an editing session.
///
/// Creating a guard while another is active (see [IncrementalParasiticsGuard::nested])
/// changes nothing, and dropping it tears nothing down;
/// only the outermost guard enables and disables incremental mode.
///
/// ```text
/// let mut guard = IncrementalParasiticsGuard::new(&mut est, &mut db)?;
/// guard.block_mut()?.place_inst(inst, Point::new(100, 200))?;
/// guard.update()?;
/// guard.finish()?;
/// ```
///
pub struct IncrementalParasiticsGuard<'a> {
    est: &'a mut Estimator,
    db: &'a mut Database,
    /// Whether this guard enabled incremental mode, and so must disable it
    need_unregister: bool,
    done: bool,
}
impl<'a> IncrementalParasiticsGuard<'a> {
    ///
    /// Enable incremental mode.
    ///
    /// Fails if nets are already awaiting re-estimation,
    /// as edits made before now would otherwise be missed.
    /// Route-based sources also open an incremental session with the global router.
    ///
    pub fn new(est: &'a mut Estimator, db: &'a mut Database) -> EstResult<Self> {
        let mut need_unregister = false;
        if !est.incremental {
            est.init_block(db)?;
            if !est.parasitics_valid()? {
                return Err(EstError::InconsistentState);
            }
            match est.parasitics_src()? {
                ParasiticsSrc::GlobalRouting | ParasiticsSrc::DetailedRouting => {
                    est.router.start_incremental();
                    est.router.set_verbose(false);
                }
                ParasiticsSrc::Placement | ParasiticsSrc::None => (),
            }
            est.incremental = true;
            need_unregister = true;
            log::debug!(target: "parasitics", "Incremental parasitics enabled");
        }
        Ok(Self {
            est,
            db,
            need_unregister,
            done: false,
        })
    }
    /// A guard within this one, which leaves incremental mode alone
    pub fn nested(&mut self) -> EstResult<IncrementalParasiticsGuard<'_>> {
        IncrementalParasiticsGuard::new(&mut *self.est, &mut *self.db)
    }
    /// Re-estimate all stale nets now
    pub fn update(&mut self) -> EstResult<()> {
        self.est.update_parasitics(&*self.db, false)
    }
    /// The block, for edits which are to be tracked
    pub fn block_mut(&mut self) -> EstResult<&mut Block> {
        self.db.block_mut().ok_or(EstError::NoBlock)
    }
    pub fn db(&self) -> &Database {
        &*self.db
    }
    pub fn estimator(&self) -> &Estimator {
        &*self.est
    }
    pub fn estimator_mut(&mut self) -> &mut Estimator {
        &mut *self.est
    }
    /// Tear down, reporting any failure of the final update
    pub fn finish(mut self) -> EstResult<()> {
        self.teardown()
    }
    ///
    /// Stop tracking edits, bring stale nets up to date, and leave incremental mode.
    /// The router session, if any, is closed and incremental mode disabled
    /// even when the final update fails.
    ///
    fn teardown(&mut self) -> EstResult<()> {
        if self.done {
            return Ok(());
        }
        self.done = true;
        if !self.need_unregister {
            return Ok(());
        }
        if let Some(block) = self.db.block_mut() {
            block.remove_callback_owner();
        }
        let result = self.est.update_parasitics(&*self.db, false);
        match self.est.parasitics_src() {
            Ok(ParasiticsSrc::GlobalRouting) | Ok(ParasiticsSrc::DetailedRouting) => {
                self.est.router.end_incremental();
                self.est.router.set_verbose(true);
            }
            _ => (),
        }
        self.est.incremental = false;
        log::debug!(target: "parasitics", "Incremental parasitics disabled");
        result
    }
}
impl Drop for IncrementalParasiticsGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            log::error!("Incremental parasitics update failed: {:?}", e);
        }
    }
}
