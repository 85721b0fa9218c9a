//! This crate provides an XPM (X PixMap) decoder and encoder for the image crate.
//!
//! The codec can be used directly:
//! ```rust,no_run
//! let data = std::fs::read("path/to/icon.xpm").unwrap();
//! let img = image_xpm::xpm::decode(&data).unwrap();
//! let text = image_xpm::xpm::encode(&img, "icon").unwrap();
//! ```
//!
//! Or, after calling the `register` function at program startup, through the image crate:
//!
//!  ```rust,no_run
//! image_xpm::register();
//!
//! // Now you can use the image crate as normal
//! let img = image::open("path/to/image.xpm").unwrap();
//! ```

#![forbid(unsafe_code)]

pub mod xpm;

use image::hooks::{register_decoding_hook, register_format_detection_hook};

static REGISTER: std::sync::Once = std::sync::Once::new();

/// Register the XPM decoder with the image crate.
pub fn register() {
    REGISTER.call_once(|| {
        if register_decoding_hook(
            "xpm".into(),
            Box::new(|r| Ok(Box::new(xpm::XpmDecoder::new(r)?))),
        ) {
            register_format_detection_hook("xpm".into(), b"/* XPM */", None);
        }
    });
}
