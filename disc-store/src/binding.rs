//! # Object Binding Seam
//!
//! Attaching a stored audio id to a world object (an item, a block, a save
//! entry) is host-specific and lives outside this crate. The core only needs
//! attach/lookup semantics, expressed here as a trait the host implements.

use crate::model::AudioId;

/// Binds audio ids to host objects.
///
/// Implementations decide what an object reference is and where the binding
/// is persisted. `lookup` must return exactly the id most recently attached
/// to the object, or `None` if nothing is attached.
pub trait AudioBinding: Send + Sync {
    type ObjectRef;

    /// Attach an audio id to an object, replacing any previous binding.
    fn attach(&self, object: &Self::ObjectRef, id: AudioId);

    /// Remove any binding from an object.
    fn detach(&self, object: &Self::ObjectRef);

    /// Read back the attached audio id, if any.
    fn lookup(&self, object: &Self::ObjectRef) -> Option<AudioId>;
}
