//! Mock keypad matrix for testing and development.
//!
//! Key presses are queued through a [`MockMatrixHandle`]. A queued press
//! closes its (row, column) contact until a scan samples it, so every press
//! is seen by exactly one scan, the way a quick tap is seen by one pass of a
//! 50 ms scan loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use crate::{HardwareError, Result, traits::Key, traits::KeypadMatrix};
use toolpanel_core::constants::KEYPAD_LAYOUT;

/// Mock keypad matrix.
///
/// # Examples
///
/// ```
/// use toolpanel_hardware::keypad::KeypadScanner;
/// use toolpanel_hardware::mock::MockMatrix;
/// use toolpanel_hardware::traits::Key;
///
/// #[tokio::main]
/// async fn main() -> toolpanel_hardware::Result<()> {
///     let (matrix, handle) = MockMatrix::new();
///     let mut scanner = KeypadScanner::new(matrix);
///
///     handle.type_symbols("12#")?;
///
///     assert_eq!(scanner.scan().await?, Some(Key::Digit(1)));
///     assert_eq!(scanner.scan().await?, Some(Key::Digit(2)));
///     assert_eq!(scanner.scan().await?, Some(Key::Hash));
///     assert_eq!(scanner.scan().await?, None);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockMatrix {
    presses: mpsc::UnboundedReceiver<Key>,
    closed_contact: Option<(usize, usize)>,
    active_row: Option<usize>,
    faulty: Arc<AtomicBool>,
}

impl MockMatrix {
    /// Create a new mock matrix with no key pressed.
    pub fn new() -> (Self, MockMatrixHandle) {
        let (tx, presses) = mpsc::unbounded_channel();
        let faulty = Arc::new(AtomicBool::new(false));

        let matrix = Self {
            presses,
            closed_contact: None,
            active_row: None,
            faulty: Arc::clone(&faulty),
        };

        (matrix, MockMatrixHandle { tx, faulty })
    }

    fn contact_of(key: Key) -> Option<(usize, usize)> {
        let symbol = key.symbol();
        KEYPAD_LAYOUT.iter().enumerate().find_map(|(row, columns)| {
            columns
                .iter()
                .position(|&c| c == symbol)
                .map(|column| (row, column))
        })
    }
}

impl KeypadMatrix for MockMatrix {
    async fn drive_row(&mut self, row: usize, active: bool) -> Result<()> {
        if self.faulty.load(Ordering::Relaxed) {
            return Err(HardwareError::pin_io(format!("simulated fault driving row {row}")));
        }

        if active {
            self.active_row = Some(row);
        } else if self.active_row == Some(row) {
            self.active_row = None;
        }

        if self.closed_contact.is_none()
            && let Ok(key) = self.presses.try_recv()
        {
            self.closed_contact = Self::contact_of(key);
        }
        Ok(())
    }

    async fn read_column(&mut self, column: usize) -> Result<bool> {
        if self.faulty.load(Ordering::Relaxed) {
            return Err(HardwareError::pin_io(format!(
                "simulated fault reading column {column}"
            )));
        }

        let hit = matches!(
            (self.active_row, self.closed_contact),
            (Some(row), Some(contact)) if contact == (row, column)
        );
        if hit {
            self.closed_contact = None;
        }
        Ok(hit)
    }
}

/// Handle for pressing keys on a mock matrix.
///
/// It can be cloned and shared across tasks.
#[derive(Debug, Clone)]
pub struct MockMatrixHandle {
    tx: mpsc::UnboundedSender<Key>,
    faulty: Arc<AtomicBool>,
}

impl MockMatrixHandle {
    /// Queue one key press.
    ///
    /// Presses are silently lost once the matrix has been dropped.
    pub fn press(&self, key: Key) {
        let _ = self.tx.send(key);
    }

    /// Queue a key press per symbol, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if a symbol is not on the keypad; nothing is queued
    /// in that case.
    pub fn type_symbols(&self, symbols: &str) -> Result<()> {
        let keys = symbols
            .chars()
            .map(Key::from_symbol)
            .collect::<Result<Vec<_>>>()?;
        for key in keys {
            self.press(key);
        }
        Ok(())
    }

    /// Make every pin operation fail until cleared.
    pub fn set_faulty(&self, faulty: bool) {
        self.faulty.store(faulty, Ordering::Relaxed);
    }
}
