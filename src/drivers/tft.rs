//! ST7789 SPI TFT via the ESP-IDF `esp_lcd` component.
//!
//! The panel is brought up in landscape (rotation 1) and receives whole
//! frames from [`TextConsole`](super::framebuffer::TextConsole) through
//! the [`Panel`] trait.  Pixels are byte-swapped to big-endian RGB565 into
//! two DMA chunk buffers used alternately, so a chunk is never rewritten
//! while its transfer is still queued.

use core::ffi::c_void;

use esp_idf_svc::sys::*;
use log::info;

use crate::drivers::framebuffer::Panel;
use crate::drivers::hw_init::HwInitError;
use crate::pins;

/// Panel rows per DMA transfer.
const CHUNK_LINES: u16 = 20;

fn esp_check(ret: esp_err_t, step: &'static str) -> Result<(), HwInitError> {
    if ret == ESP_OK as i32 { Ok(()) } else { Err(HwInitError::LcdInitFailed(step, ret)) }
}

pub struct St7789 {
    panel: esp_lcd_panel_handle_t,
    dma: [*mut u8; 2],
    dma_bytes: usize,
}

impl St7789 {
    /// Bring up SPI2, the panel IO, and the ST7789 controller.
    pub fn init() -> Result<Self, HwInitError> {
        let chunk_bytes = usize::from(pins::TFT_WIDTH) * usize::from(CHUNK_LINES) * 2;

        let mut bus_cfg = spi_bus_config_t::default();
        bus_cfg.__bindgen_anon_1.mosi_io_num = pins::TFT_MOSI_GPIO;
        bus_cfg.__bindgen_anon_2.miso_io_num = -1;
        bus_cfg.__bindgen_anon_3.quadwp_io_num = -1;
        bus_cfg.__bindgen_anon_4.quadhd_io_num = -1;
        bus_cfg.sclk_io_num = pins::TFT_SCLK_GPIO;
        bus_cfg.max_transfer_sz = chunk_bytes as i32;

        let host = spi_host_device_t_SPI2_HOST;
        // SAFETY: one-time bus bring-up from main before the tick loop.
        esp_check(
            unsafe { spi_bus_initialize(host, &bus_cfg, spi_common_dma_t_SPI_DMA_CH_AUTO) },
            "spi_bus_initialize",
        )?;

        let mut io: esp_lcd_panel_io_handle_t = core::ptr::null_mut();
        let io_cfg = esp_lcd_panel_io_spi_config_t {
            cs_gpio_num: pins::TFT_CS_GPIO,
            dc_gpio_num: pins::TFT_DC_GPIO,
            spi_mode: 0,
            pclk_hz: pins::TFT_SPI_FREQ_HZ,
            trans_queue_depth: 10,
            lcd_cmd_bits: 8,
            lcd_param_bits: 8,
            ..Default::default()
        };
        esp_check(
            unsafe { esp_lcd_new_panel_io_spi(host as esp_lcd_spi_bus_handle_t, &io_cfg, &mut io) },
            "esp_lcd_new_panel_io_spi",
        )?;

        let mut panel: esp_lcd_panel_handle_t = core::ptr::null_mut();
        let mut panel_cfg = esp_lcd_panel_dev_config_t {
            reset_gpio_num: pins::TFT_RST_GPIO,
            bits_per_pixel: 16,
            ..Default::default()
        };
        panel_cfg.__bindgen_anon_1.rgb_ele_order = lcd_rgb_element_order_t_LCD_RGB_ELEMENT_ORDER_RGB;
        esp_check(
            unsafe { esp_lcd_new_panel_st7789(io, &panel_cfg, &mut panel) },
            "esp_lcd_new_panel_st7789",
        )?;

        esp_check(unsafe { esp_lcd_panel_reset(panel) }, "panel_reset")?;
        esp_check(unsafe { esp_lcd_panel_init(panel) }, "panel_init")?;
        esp_check(unsafe { esp_lcd_panel_invert_color(panel, true) }, "invert_color")?;
        // Rotation 1: landscape.
        esp_check(unsafe { esp_lcd_panel_swap_xy(panel, true) }, "swap_xy")?;
        esp_check(unsafe { esp_lcd_panel_mirror(panel, true, false) }, "mirror")?;
        esp_check(unsafe { esp_lcd_panel_disp_on_off(panel, true) }, "disp_on")?;

        let mut dma = [core::ptr::null_mut::<u8>(); 2];
        for slot in &mut dma {
            // SAFETY: plain allocation; freed in Drop.
            let ptr = unsafe { heap_caps_malloc(chunk_bytes, MALLOC_CAP_DMA | MALLOC_CAP_INTERNAL) }.cast::<u8>();
            if ptr.is_null() {
                return Err(HwInitError::LcdInitFailed("dma alloc", ESP_ERR_NO_MEM as i32));
            }
            *slot = ptr;
        }

        // SAFETY: backlight pin is a plain push-pull output owned by this driver.
        unsafe {
            gpio_set_direction(pins::TFT_BL_GPIO, gpio_mode_t_GPIO_MODE_OUTPUT);
            gpio_set_level(pins::TFT_BL_GPIO, 1);
        }

        info!("tft: ST7789 {}x{} ready", pins::TFT_WIDTH, pins::TFT_HEIGHT);
        Ok(Self { panel, dma, dma_bytes: chunk_bytes })
    }
}

impl Panel for St7789 {
    fn draw(&mut self, width: u16, height: u16, pixels: &[u16]) {
        let w = usize::from(width);
        let mut y = 0u16;
        let mut slot = 0usize;
        while y < height {
            let y_end = (y + CHUNK_LINES).min(height);
            let src = &pixels[usize::from(y) * w..usize::from(y_end) * w];

            // SAFETY: each buffer holds dma_bytes; src never exceeds one chunk
            // because width <= TFT_WIDTH.
            let dst = unsafe { core::slice::from_raw_parts_mut(self.dma[slot], self.dma_bytes) };
            for (i, px) in src.iter().enumerate() {
                let [hi, lo] = px.to_be_bytes();
                dst[i * 2] = hi;
                dst[i * 2 + 1] = lo;
            }

            // SAFETY: panel handle is valid for the driver lifetime.  The
            // previous transfer from this slot finished before the last
            // draw_bitmap call returned.
            unsafe {
                esp_lcd_panel_draw_bitmap(
                    self.panel,
                    0,
                    i32::from(y),
                    i32::from(width),
                    i32::from(y_end),
                    dst.as_ptr().cast::<c_void>(),
                );
            }
            slot ^= 1;
            y = y_end;
        }
    }
}

impl Drop for St7789 {
    fn drop(&mut self) {
        // SAFETY: buffers came from heap_caps_malloc in init().
        unsafe {
            for ptr in self.dma {
                heap_caps_free(ptr.cast());
            }
        }
    }
}
