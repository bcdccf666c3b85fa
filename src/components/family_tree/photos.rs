use std::collections::HashMap;

use log::warn;
use web_sys::HtmlImageElement;

use crate::family::UserId;

/// Avatar images keyed by user, loaded lazily from their public URLs.
#[derive(Default)]
pub struct PhotoCache {
	images: HashMap<UserId, Option<HtmlImageElement>>,
}

impl PhotoCache {
	/// The photo for `id` once the browser has finished loading it. The first
	/// call starts the download.
	pub fn get(&mut self, id: &UserId, url: &str) -> Option<&HtmlImageElement> {
		let entry = self
			.images
			.entry(id.clone())
			.or_insert_with(|| match HtmlImageElement::new() {
				Ok(img) => {
					img.set_src(url);
					Some(img)
				}
				Err(err) => {
					warn!("cannot create image element for {id}: {err:?}");
					None
				}
			});
		entry
			.as_ref()
			.filter(|img| img.complete() && img.natural_width() > 0)
	}

	pub fn clear(&mut self) {
		self.images.clear();
	}
}
