//! Status screen composition.
//!
//! Fixed layout, one row per reading, repainted in full every tick:
//!
//! ```text
//!  (10,  5)  Fan lvl: 4 | off
//!  (10, 20)  LDR: 512
//!  (10, 35)  Temp: 21.4 C
//!  (10, 50)  Hum: 48.2 %
//!  (10, 65)  X: 0.01
//!  (10, 80)  Y: -0.02
//!  (10, 95)  Z: 0.98
//! ```

use core::fmt::Write;

use embedded_graphics::pixelcolor::{Rgb565, RgbColor};

use crate::app::ports::DisplayPort;
use crate::app::snapshot::SensorSnapshot;

pub const LEFT_MARGIN: i32 = 10;
pub const ROW_TOP: i32 = 5;
pub const ROW_PITCH: i32 = 15;

pub const BACKGROUND: Rgb565 = Rgb565::BLACK;
pub const ERROR_BACKGROUND: Rgb565 = Rgb565::RED;

pub const INIT_ERROR_TEXT: &str = "Initialization Error!";
const INIT_ERROR_POS: (i32, i32) = (10, 50);

type Line = heapless::String<48>;

/// Compose the seven status rows for one tick.
///
/// Pure formatting, kept separate from drawing so the text can be
/// checked without a display.
pub fn status_lines(touch_count: u8, snap: &SensorSnapshot) -> [Line; 7] {
    let mut rows: [Line; 7] = Default::default();
    // Every row is far below the 48-byte capacity.
    let _ = if touch_count > 0 {
        write!(rows[0], "Fan lvl: {}", touch_count)
    } else {
        write!(rows[0], "Fan lvl: off")
    };
    let _ = write!(rows[1], "LDR: {}", snap.light_level);
    let _ = write!(rows[2], "Temp: {:.1} C", snap.temperature_c);
    let _ = write!(rows[3], "Hum: {:.1} %", snap.humidity_pct);
    let _ = write!(rows[4], "X: {:.2}", snap.accel_x);
    let _ = write!(rows[5], "Y: {:.2}", snap.accel_y);
    let _ = write!(rows[6], "Z: {:.2}", snap.accel_z);
    rows
}

/// Clear and repaint the full status screen.
pub fn render_status(display: &mut impl DisplayPort, touch_count: u8, snap: &SensorSnapshot) {
    display.clear(BACKGROUND);
    for (i, line) in status_lines(touch_count, snap).iter().enumerate() {
        display.set_cursor(LEFT_MARGIN, ROW_TOP + ROW_PITCH * i as i32);
        display.print(line);
    }
    display.flush();
}

/// Terminal error screen shown when a core driver fails at boot.
pub fn render_init_error(display: &mut impl DisplayPort) {
    display.clear(ERROR_BACKGROUND);
    display.set_cursor(INIT_ERROR_POS.0, INIT_ERROR_POS.1);
    display.print(INIT_ERROR_TEXT);
    display.flush();
}
