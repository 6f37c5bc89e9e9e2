//! Dummy GPU backend for testing and development.
//!
//! This backend doesn't perform actual GPU operations. It records every
//! submitted command in FIFO order so tests can inspect uploads, bindings,
//! draws and releases without requiring GPU hardware.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::error::GraphicsError;

use super::{BackendCommand, GpuBackend};

/// Parameters of one recorded indexed draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedDraw {
    pub index_count: u32,
    pub base_index: u32,
    pub base_vertex: u32,
}

/// Dummy GPU backend.
#[derive(Debug, Default)]
pub struct DummyBackend {
    commands: Mutex<Vec<BackendCommand>>,
    lost: AtomicBool,
}

impl DummyBackend {
    /// Create a new dummy backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every command recorded so far.
    pub fn commands(&self) -> Vec<BackendCommand> {
        self.commands.lock().clone()
    }

    /// Remove and return every command recorded so far.
    pub fn take_commands(&self) -> Vec<BackendCommand> {
        std::mem::take(&mut *self.commands.lock())
    }

    /// Number of recorded commands.
    pub fn command_count(&self) -> usize {
        self.commands.lock().len()
    }

    /// Forget every recorded command.
    pub fn clear(&self) {
        self.commands.lock().clear();
    }

    /// Recorded indexed draws, in submission order.
    pub fn draw_calls(&self) -> Vec<RecordedDraw> {
        self.commands
            .lock()
            .iter()
            .filter_map(|command| match *command {
                BackendCommand::DrawIndexed {
                    index_count,
                    base_index,
                    base_vertex,
                } => Some(RecordedDraw {
                    index_count,
                    base_index,
                    base_vertex,
                }),
                _ => None,
            })
            .collect()
    }

    /// Simulate a lost device: every later submission fails.
    pub fn set_device_lost(&self, lost: bool) {
        self.lost.store(lost, Ordering::Release);
    }
}

impl GpuBackend for DummyBackend {
    fn name(&self) -> &str {
        "Dummy Backend"
    }

    fn submit(&self, command: BackendCommand) -> Result<(), GraphicsError> {
        if self.lost.load(Ordering::Acquire) {
            return Err(GraphicsError::DeviceLost);
        }

        match &command {
            BackendCommand::CreateBuffer { id, descriptor } => log::trace!(
                "DummyBackend: creating buffer {:?} {:?} (size: {})",
                id,
                descriptor.label,
                descriptor.size
            ),
            BackendCommand::CreateTexture { id, descriptor, .. } => log::trace!(
                "DummyBackend: creating texture {:?} {:?} ({}x{})",
                id,
                descriptor.label,
                descriptor.width,
                descriptor.height
            ),
            BackendCommand::DrawIndexed {
                index_count,
                base_index,
                base_vertex,
            } => log::trace!(
                "DummyBackend: draw_indexed (indices: {}, base index: {}, base vertex: {})",
                index_count,
                base_index,
                base_vertex
            ),
            BackendCommand::ReleaseBuffer { id } => {
                log::trace!("DummyBackend: releasing buffer {:?}", id)
            }
            BackendCommand::ReleaseTexture { id } => {
                log::trace!("DummyBackend: releasing texture {:?}", id)
            }
            _ => {}
        }

        self.commands.lock().push(command);
        Ok(())
    }
}

static_assertions::assert_impl_all!(DummyBackend: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BufferId, TextureId};

    #[test]
    fn test_records_in_order() {
        let backend = DummyBackend::new();
        backend
            .submit(BackendCommand::BindVertexBuffer { id: BufferId(1) })
            .unwrap();
        backend
            .submit(BackendCommand::BindTexture {
                id: TextureId(2),
                slot: 3,
            })
            .unwrap();
        backend
            .submit(BackendCommand::DrawIndexed {
                index_count: 6,
                base_index: 0,
                base_vertex: 0,
            })
            .unwrap();

        let commands = backend.commands();
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[0], BackendCommand::BindVertexBuffer { id: BufferId(1) });
        assert_eq!(
            backend.draw_calls(),
            vec![RecordedDraw {
                index_count: 6,
                base_index: 0,
                base_vertex: 0
            }]
        );
    }

    #[test]
    fn test_take_commands_drains() {
        let backend = DummyBackend::new();
        backend
            .submit(BackendCommand::ReleaseBuffer { id: BufferId(7) })
            .unwrap();
        assert_eq!(backend.take_commands().len(), 1);
        assert_eq!(backend.command_count(), 0);
    }

    #[test]
    fn test_device_lost() {
        let backend = DummyBackend::new();
        backend.set_device_lost(true);
        let result = backend.submit(BackendCommand::ReleaseTexture { id: TextureId(1) });
        assert_eq!(result, Err(GraphicsError::DeviceLost));
        assert_eq!(backend.command_count(), 0);
    }
}
