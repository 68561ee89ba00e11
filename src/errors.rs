use failure::Fail;

use crate::ecs::component::StableId;
use crate::ecs::EntityId;

/// Recoverable anomalies. Every one of them is also forwarded to the
/// `EventSink` error channel of the `World` that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Fail)]
pub enum Error {
    #[fail(display = "{} does not exist.", _0)]
    EntityNotFound(EntityId),
    #[fail(display = "{} does not have a component of type {}.", entity, component)]
    ComponentNotFound {
        entity: EntityId,
        component: &'static str,
    },
    #[fail(display = "{} is not a child of {}.", child, parent)]
    ChildNotFound { parent: EntityId, child: EntityId },
    #[fail(display = "{} can not set self as parent.", _0)]
    SelfParent(EntityId),
    #[fail(display = "{} is an ancestor of {}, attaching would create a cycle.", child, parent)]
    CyclicHierarchy { child: EntityId, parent: EntityId },
    #[fail(display = "Stable identifier {} is already bound.", _0)]
    DuplicateStableId(StableId),
}

pub type Result<T> = ::std::result::Result<T, Error>;
