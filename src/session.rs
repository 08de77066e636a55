//! Request-scoped QR symbol context
//!
//! A [`QrSession`] carries everything a render or download needs: the text
//! being encoded, the symbol chosen for it and, for tracked codes, the short
//! code. It is built per request and passed along explicitly.

use crate::capacity::{fit, ECLevel, Mode, SymbolError, SymbolSpec};

/// Symbol options supplied by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SymbolRequest {
    pub level: ECLevel,
    pub mode: Option<Mode>,
    /// `None` or `Some(0)` selects the smallest fitting version
    pub version: Option<u8>,
}

/// Pixel layout of a raster download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterLayout {
    /// Pixels per module
    pub cell_size: u32,
    /// Side length of the image, a whole number of modules
    pub actual_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrSession {
    content: String,
    symbol: SymbolSpec,
    short_code: Option<String>,
}

impl QrSession {
    /// Session for a code that encodes `text` directly
    pub fn plain(text: &str, request: SymbolRequest) -> Result<Self, SymbolError> {
        let symbol = fit(text, request.level, request.mode, request.version)?;
        Ok(Self {
            content: text.to_string(),
            symbol,
            short_code: None,
        })
    }

    /// Session for a tracked code, which encodes its redirect URL
    pub fn tracked(
        redirect_url: &str,
        short_code: &str,
        request: SymbolRequest,
    ) -> Result<Self, SymbolError> {
        let mut session = Self::plain(redirect_url, request)?;
        session.short_code = Some(short_code.to_string());
        Ok(session)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn symbol(&self) -> SymbolSpec {
        self.symbol
    }

    pub fn short_code(&self) -> Option<&str> {
        self.short_code.as_deref()
    }

    /// Largest whole-module layout that fits in `target_px`
    ///
    /// Returns `None` when the target is smaller than one pixel per module.
    pub fn raster_layout(&self, target_px: u32) -> Option<RasterLayout> {
        let modules = self.symbol.modules();
        let cell_size = target_px / modules;
        if cell_size == 0 {
            return None;
        }
        Some(RasterLayout {
            cell_size,
            actual_size: cell_size * modules,
        })
    }

    pub fn png_filename(&self, actual_size: u32) -> String {
        match &self.short_code {
            Some(code) => format!("qrcode_tracked_{code}_{actual_size}x{actual_size}.png"),
            None => format!("qrcode_{actual_size}x{actual_size}.png"),
        }
    }

    pub fn svg_filename(&self) -> String {
        match &self.short_code {
            Some(code) => format!("qrcode_tracked_{code}.svg"),
            None => "qrcode.svg".to_string(),
        }
    }
}
