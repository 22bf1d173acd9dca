pub mod camera;
pub mod command;
pub mod commands;
pub mod convert;
pub mod history;
pub mod scene;
pub mod selection;
pub mod tools;
pub mod viewport;

pub mod errors {
    use geomedit_core::document::{EntityId, EntityKind};
    use thiserror::Error;

    /// 编辑操作的失败原因。所有失败都在边界处以 `Err` 返回，不会留下部分修改。
    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum EditError {
        #[error("{kind} with id {id} already exists")]
        DuplicateId { kind: EntityKind, id: EntityId },
        #[error("{kind} with id {id} not found")]
        NotFound { kind: EntityKind, id: EntityId },
        #[error("{kind} needs at least {required} points, got {actual}")]
        TooFewPoints {
            kind: EntityKind,
            required: usize,
            actual: usize,
        },
        #[error("invalid reference: {0}")]
        InvalidReference(String),
        #[error("point {0} is still referenced by other entities")]
        PointInUse(EntityId),
        #[error("degenerate geometry: {0}")]
        Degenerate(&'static str),
        #[error("coordinates must be finite")]
        NonFinite,
        #[error("{kind} {id} is locked")]
        Locked { kind: EntityKind, id: EntityId },
        #[error("no duplicate points closer than {0}")]
        NothingToMerge(f64),
        #[error("nothing to undo")]
        NothingToUndo,
        #[error("nothing to redo")]
        NothingToRedo,
        #[error("command has not been applied yet")]
        NotApplied,
    }

    impl EditError {
        pub fn not_found(kind: EntityKind, id: &EntityId) -> Self {
            Self::NotFound {
                kind,
                id: id.clone(),
            }
        }

        pub fn locked(kind: EntityKind, id: &EntityId) -> Self {
            Self::Locked {
                kind,
                id: id.clone(),
            }
        }

        pub fn duplicate(kind: EntityKind, id: &EntityId) -> Self {
            Self::DuplicateId {
                kind,
                id: id.clone(),
            }
        }
    }
}

pub use errors::EditError;
pub use scene::Scene;
