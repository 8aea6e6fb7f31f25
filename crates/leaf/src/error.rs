use core::fmt;

use leaf_dom::DomError;

/// Fatal failures of a render pass.
///
/// Effect and cleanup failures and unknown host events are recovered where they
/// happen (logged, execution continues) and never show up here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A hook was called while no component build was in progress.
    InvalidHookContext {
        /// Name of the hook primitive that was called.
        hook: &'static str,
    },
    /// A fiber carried a kind or classification the pipeline stage does not accept.
    StructuralInvariant(String),
    /// The slot at `index` holds a different kind of hook than the one being called.
    /// Hooks must be called in the same order on every build of an instance.
    HookSlotMismatch {
        /// Instance key of the component.
        instance: String,
        /// Call-order index of the slot.
        index: usize,
        /// Hook kind requested by the current call.
        expected: &'static str,
        /// Hook kind stored in the slot.
        found: &'static str,
    },
    /// `request_render` was called before a render function was registered.
    SchedulerNotConfigured,
    /// The configured bound on follow-up passes in a single drain was reached.
    ChainedPassLimit {
        /// The configured bound.
        limit: u32,
    },
    /// The render target rejected a primitive operation.
    Dom(DomError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHookContext { hook } => {
                write!(f, "{hook} called outside of a component build")
            }
            Self::StructuralInvariant(message) => write!(f, "structural invariant violated: {message}"),
            Self::HookSlotMismatch {
                instance,
                index,
                expected,
                found,
            } => write!(
                f,
                "hook order changed in {instance}: slot {index} holds {found}, {expected} was requested"
            ),
            Self::SchedulerNotConfigured => f.write_str("no render function registered with the scheduler"),
            Self::ChainedPassLimit { limit } => {
                write!(f, "render requests kept arriving after {limit} follow-up passes")
            }
            Self::Dom(err) => write!(f, "render target error: {err}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Dom(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DomError> for RenderError {
    fn from(err: DomError) -> Self {
        Self::Dom(err)
    }
}
