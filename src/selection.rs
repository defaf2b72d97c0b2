//! Scoped selection
//!
//! Host adapters frequently change the active selection while building or
//! updating containers. [`maintained_selection`] saves the selection, runs the
//! caller's block and restores the prior selection on every exit path,
//! including unwinding.

/// Host capability for reading and replacing the active selection
pub trait Selection {
    type Node: Clone;

    /// Currently selected nodes, in selection order
    fn selected_nodes(&self) -> Vec<Self::Node>;

    /// Replace the selection with exactly `nodes` (empty clears it)
    fn set_selection(&mut self, nodes: &[Self::Node]);
}

struct SelectionGuard<'a, H: Selection> {
    host: &'a mut H,
    previous: Vec<H::Node>,
}

impl<H: Selection> Drop for SelectionGuard<'_, H> {
    fn drop(&mut self) {
        self.host.set_selection(&self.previous);
    }
}

/// Run `f` and restore the host's selection afterwards.
///
/// ```
/// use scene_containers::memory::MemoryScene;
/// use scene_containers::selection::{maintained_selection, Selection};
///
/// let mut scene = MemoryScene::new();
/// let a = scene.create_node("/obj/a").unwrap();
/// scene.set_selection(&[a]);
///
/// maintained_selection(&mut scene, |scene| scene.set_selection(&[]));
/// assert_eq!(scene.selected_nodes(), vec![a]);
/// ```
pub fn maintained_selection<H, T, F>(host: &mut H, f: F) -> T
where
    H: Selection,
    F: FnOnce(&mut H) -> T,
{
    let previous = host.selected_nodes();
    let mut guard = SelectionGuard { host, previous };
    f(&mut *guard.host)
}
