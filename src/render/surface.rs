//! Output surfaces.

use crate::error::{OrreryError, OrreryResult};

use super::RenderCommand;

/// Where frames go.
///
/// A surface is acquired once on mount and released once on unmount.
/// Acquisition failure makes the whole view unavailable.
pub trait Surface {
    /// Drawable size in pixels.
    fn size(&self) -> (u32, u32);

    /// Obtain the drawing context.
    ///
    /// # Errors
    ///
    /// Returns [`OrreryError::Unavailable`] if no context can be created.
    fn acquire(&mut self) -> OrreryResult<()>;

    /// Change the output resolution.
    fn resize(&mut self, width: u32, height: u32);

    /// Draw one frame.
    ///
    /// # Errors
    ///
    /// Fails if the surface was released or never acquired.
    fn present(&mut self, commands: &[RenderCommand]) -> OrreryResult<()>;

    /// Release the context. Idempotent.
    fn release(&mut self);
}

/// Surface that keeps the last frame in memory.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    width: u32,
    height: u32,
    acquired: bool,
    released: bool,
    failure: Option<String>,
    frames: u64,
    last_frame: Vec<RenderCommand>,
}

impl HeadlessSurface {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// A surface whose acquisition always fails.
    #[must_use]
    pub fn unavailable(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::new(width, height)
        }
    }

    /// Frames presented so far.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Commands of the most recent frame.
    #[must_use]
    pub fn last_frame(&self) -> &[RenderCommand] {
        &self.last_frame
    }

    #[must_use]
    pub const fn is_released(&self) -> bool {
        self.released
    }
}

impl Surface for HeadlessSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn acquire(&mut self) -> OrreryResult<()> {
        if let Some(reason) = &self.failure {
            return Err(OrreryError::unavailable(reason.clone()));
        }
        if self.released {
            return Err(OrreryError::Disposed("surface".to_string()));
        }
        self.acquired = true;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn present(&mut self, commands: &[RenderCommand]) -> OrreryResult<()> {
        if self.released {
            return Err(OrreryError::Disposed("surface".to_string()));
        }
        if !self.acquired {
            return Err(OrreryError::unavailable("surface not acquired"));
        }
        self.frames += 1;
        self.last_frame = commands.to_vec();
        Ok(())
    }

    fn release(&mut self) {
        self.released = true;
        self.acquired = false;
        self.last_frame.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn test_headless_lifecycle() {
        let mut surface = HeadlessSurface::new(640, 480);
        assert!(surface.present(&[]).is_err());
        assert!(surface.acquire().is_ok());
        let frame = [RenderCommand::Clear { color: Color::FOG }];
        assert!(surface.present(&frame).is_ok());
        assert_eq!(surface.frames(), 1);
        assert_eq!(surface.last_frame().len(), 1);

        surface.release();
        surface.release();
        assert!(surface.is_released());
        assert!(matches!(surface.present(&frame), Err(OrreryError::Disposed(_))));
        assert!(surface.acquire().is_err());
    }

    #[test]
    fn test_unavailable_surface() {
        let mut surface = HeadlessSurface::unavailable(640, 480, "no context");
        let err = surface.acquire();
        assert!(matches!(err, Err(OrreryError::Unavailable { .. })));
    }

    #[test]
    fn test_resize() {
        let mut surface = HeadlessSurface::new(640, 480);
        surface.resize(1280, 720);
        assert_eq!(surface.size(), (1280, 720));
    }
}
