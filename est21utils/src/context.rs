//!
//! # Error Contexts
//!

/// Enumerated estimation contexts.
/// Stacked by builders as they descend, and attached to errors they report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorContext {
    Block(String),
    Net(String),
    Layer(String),
    Corner(String),
    Route,
    Steiner,
    Config,
}
impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Block(s) => write!(f, "block {}", s),
            Self::Net(s) => write!(f, "net {}", s),
            Self::Layer(s) => write!(f, "layer {}", s),
            Self::Corner(s) => write!(f, "corner {}", s),
            Self::Route => write!(f, "global route"),
            Self::Steiner => write!(f, "steiner tree"),
            Self::Config => write!(f, "configuration"),
        }
    }
}

/// # Context Stack
///
/// Push on the way down, pop on the way up.
/// Cloned into errors when something fails.
#[derive(Debug, Clone, Default)]
pub struct ContextStack(Vec<ErrorContext>);
impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn push(&mut self, ctx: ErrorContext) {
        self.0.push(ctx)
    }
    pub fn pop(&mut self) -> Option<ErrorContext> {
        self.0.pop()
    }
    /// Copy of the active contexts, outermost first
    pub fn snapshot(&self) -> Vec<ErrorContext> {
        self.0.clone()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
