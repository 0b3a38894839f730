mod qr;

pub use qr::QrRenderer;
