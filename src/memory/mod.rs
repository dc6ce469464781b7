/*!
 * Memory Module
 * Shared memory blocks and typed views over them
 */

pub mod block;
pub mod view;

pub use block::SharedBlock;
pub use view::{ElementKind, SharedView};
