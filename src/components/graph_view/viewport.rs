//! Viewport sizing and fit-to-content transforms.
//!
//! The container size arrives through notifications (a `ResizeObserver` in
//! the browser). Notifications are only recorded; the latest one is applied
//! on the next animation frame together with any pending fit, so a drag-resize
//! costs one refit per frame at most.
//!
//! A fit against a container that has not been measured yet (zero width or
//! height) stays pending instead of producing an infinite or NaN scale.

use log::debug;

use super::types::Point;

/// Zoom limits for interactive wheel zoom.
const MIN_USER_ZOOM: f64 = 0.1;
const MAX_USER_ZOOM: f64 = 10.0;

/// Container size in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
	pub width: f64,
	pub height: f64,
}

impl Size {
	pub const fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	/// Whether the container has a usable, non-zero size.
	pub fn is_measured(&self) -> bool {
		self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
	}
}

/// Pan and zoom transform: `screen = world * k + (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	/// Zoom factor (1.0 = 100%).
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	pub fn to_screen(&self, p: Point) -> Point {
		Point::new(p.x * self.k + self.x, p.y * self.k + self.y)
	}

	pub fn to_world(&self, sx: f64, sy: f64) -> Point {
		Point::new((sx - self.x) / self.k, (sy - self.y) / self.k)
	}
}

/// Axis-aligned bounding box in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	pub min: Point,
	pub max: Point,
}

impl Bounds {
	/// Bounding box of the finite points, or `None` if there are none.
	pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
		points
			.into_iter()
			.filter(|p| p.is_finite())
			.fold(None, |acc: Option<Bounds>, &p| {
				Some(match acc {
					None => Bounds { min: p, max: p },
					Some(b) => Bounds {
						min: Point::new(b.min.x.min(p.x), b.min.y.min(p.y)),
						max: Point::new(b.max.x.max(p.x), b.max.y.max(p.y)),
					},
				})
			})
	}

	pub fn width(&self) -> f64 {
		self.max.x - self.min.x
	}

	pub fn height(&self) -> f64 {
		self.max.y - self.min.y
	}

	pub fn center(&self) -> Point {
		Point::new(
			(self.min.x + self.max.x) / 2.0,
			(self.min.y + self.max.y) / 2.0,
		)
	}
}

/// Largest share of the shorter container side one padding may take.
const MAX_PADDING_FRACTION: f64 = 0.25;

/// Padding actually applied in a container of `size`. Small containers get
/// proportionally less so at least half of each side stays usable.
pub fn effective_padding(size: Size, padding: f64) -> f64 {
	padding
		.max(0.0)
		.min(size.width.min(size.height) * MAX_PADDING_FRACTION)
}

/// Transform that makes `bounds` fill `size` minus the
/// [`effective_padding`] on every side, preserving aspect ratio, centred,
/// and zoomed no further than `max_zoom`.
///
/// Returns `None` when the container is not measured.
pub fn fit_transform(
	bounds: Bounds,
	size: Size,
	padding: f64,
	max_zoom: f64,
) -> Option<ViewTransform> {
	if !size.is_measured() {
		return None;
	}
	let padding = effective_padding(size, padding);
	let avail_w = size.width - 2.0 * padding;
	let avail_h = size.height - 2.0 * padding;

	let ratio = |avail: f64, extent: f64| {
		if extent > f64::EPSILON {
			avail / extent
		} else {
			f64::INFINITY
		}
	};
	let mut k = ratio(avail_w, bounds.width()).min(ratio(avail_h, bounds.height()));
	if max_zoom > 0.0 {
		k = k.min(max_zoom);
	}
	if !k.is_finite() {
		// Single point and no zoom cap.
		k = 1.0;
	}

	let center = bounds.center();
	Some(ViewTransform {
		x: size.width / 2.0 - center.x * k,
		y: size.height / 2.0 - center.y * k,
		k,
	})
}

/// Bounded retry-with-backoff for platforms without size notifications.
///
/// Polls are due on frames 1, 2, 4, 8, ... up to `max_attempts` polls.
#[derive(Clone, Debug)]
pub struct SettleRetry {
	next_frame: u64,
	attempts: u32,
	max_attempts: u32,
}

impl SettleRetry {
	pub fn new(max_attempts: u32) -> Self {
		Self {
			next_frame: 1,
			attempts: 0,
			max_attempts,
		}
	}

	/// Whether the container should be measured on `frame`.
	pub fn poll_due(&mut self, frame: u64) -> bool {
		if self.attempts >= self.max_attempts || frame < self.next_frame {
			return false;
		}
		self.attempts += 1;
		self.next_frame = self.next_frame.saturating_mul(2);
		true
	}

	pub fn exhausted(&self) -> bool {
		self.attempts >= self.max_attempts
	}
}

impl Default for SettleRetry {
	fn default() -> Self {
		Self::new(6)
	}
}

/// What a viewport frame changed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameUpdate {
	/// New container size, if one was applied this frame.
	pub resized: Option<Size>,
	/// Whether the transform was refit this frame.
	pub refit: bool,
}

/// Owns the container size and the view transform.
#[derive(Clone, Debug)]
pub struct ViewportManager {
	size: Size,
	pending_size: Option<Size>,
	transform: ViewTransform,
	padding: f64,
	max_zoom: f64,
	fit_pending: bool,
	auto_fit: bool,
}

impl ViewportManager {
	pub fn new(padding: f64, max_zoom: f64) -> Self {
		Self {
			size: Size::default(),
			pending_size: None,
			transform: ViewTransform::default(),
			padding,
			max_zoom,
			fit_pending: false,
			auto_fit: true,
		}
	}

	pub fn size(&self) -> Size {
		self.size
	}

	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	pub fn is_fit_pending(&self) -> bool {
		self.fit_pending
	}

	pub fn is_auto_fit(&self) -> bool {
		self.auto_fit
	}

	/// Record a container measurement. Applied on the next frame.
	pub fn observe_size(&mut self, size: Size) {
		self.pending_size = Some(size);
	}

	/// Ask for a fit on the next frame and return to auto-fit mode.
	pub fn request_fit(&mut self) {
		self.fit_pending = true;
		self.auto_fit = true;
	}

	/// Apply the coalesced size and any pending fit against `bounds`.
	///
	/// `content_moved` signals that positions changed since the last frame, so
	/// auto-fit should follow them.
	pub fn on_frame(&mut self, bounds: Option<Bounds>, content_moved: bool) -> FrameUpdate {
		let mut update = FrameUpdate::default();

		if let Some(size) = self.pending_size.take() {
			if size != self.size {
				self.size = size;
				update.resized = Some(size);
				if self.auto_fit {
					self.fit_pending = true;
				}
			}
		}
		if content_moved && self.auto_fit {
			self.fit_pending = true;
		}

		if !self.fit_pending {
			return update;
		}
		let Some(bounds) = bounds else {
			// Empty graph: nothing to fit.
			self.fit_pending = false;
			return update;
		};
		// Unmeasured containers keep the request pending.
		if let Some(transform) = fit_transform(bounds, self.size, self.padding, self.max_zoom) {
			if transform != self.transform {
				debug!(
					"viewport: fit to {}x{} at k={:.3}",
					self.size.width, self.size.height, transform.k
				);
			}
			self.transform = transform;
			self.fit_pending = false;
			update.refit = true;
		}
		update
	}

	/// Pan by a screen-space delta. Leaves auto-fit mode.
	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		self.transform.x += dx;
		self.transform.y += dy;
		self.auto_fit = false;
	}

	/// Zoom by `factor` keeping the screen point `(sx, sy)` fixed. Leaves
	/// auto-fit mode.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let t = &mut self.transform;
		let new_k = (t.k * factor).clamp(MIN_USER_ZOOM, MAX_USER_ZOOM);
		let ratio = new_k / t.k;
		t.x = sx - (sx - t.x) * ratio;
		t.y = sy - (sy - t.y) * ratio;
		t.k = new_k;
		self.auto_fit = false;
	}
}
