//! Row/column keypad scanner.
//!
//! A scan drives each row active in turn, with every other row inactive, and
//! samples the columns of the active row. The first active (row, column) pair
//! wins, so a scan reports at most one key. Contacts are not debounced: a
//! bouncing key may read as "no key" on one scan and as the real key on the
//! next, and callers are expected to scan again.

use tracing::trace;

use crate::Result;
use crate::traits::{Key, KeypadMatrix};
use toolpanel_core::constants::{KEYPAD_COLUMNS, KEYPAD_LAYOUT, KEYPAD_ROWS};

/// Scanner over a 4x3 keypad matrix.
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
///     assert_eq!(scanner.scan().await?, None);
///
///     handle.press(Key::Digit(8));
///     assert_eq!(scanner.scan().await?, Some(Key::Digit(8)));
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct KeypadScanner<M> {
    matrix: M,
}

impl<M: KeypadMatrix> KeypadScanner<M> {
    /// Create a scanner over the given matrix pins.
    pub fn new(matrix: M) -> Self {
        Self { matrix }
    }

    /// Perform one full scan of the matrix.
    ///
    /// Returns `Ok(None)` when no key is pressed.
    ///
    /// # Errors
    ///
    /// Returns an error if a row cannot be driven or a column cannot be read.
    pub async fn scan(&mut self) -> Result<Option<Key>> {
        for row in 0..KEYPAD_ROWS {
            for other in 0..KEYPAD_ROWS {
                self.matrix.drive_row(other, other == row).await?;
            }

            for column in 0..KEYPAD_COLUMNS {
                if self.matrix.read_column(column).await? {
                    let key = Key::from_symbol(KEYPAD_LAYOUT[row][column])?;
                    trace!(row, column, symbol = %key.symbol(), "key detected");
                    return Ok(Some(key));
                }
            }
        }

        Ok(None)
    }

    /// Access the underlying matrix.
    pub fn matrix(&self) -> &M {
        &self.matrix
    }

    /// Consume the scanner, returning the matrix pins.
    pub fn into_inner(self) -> M {
        self.matrix
    }
}
