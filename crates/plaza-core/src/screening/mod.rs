//! The publication screen.
//!
//! Every post passes through the external content classifier before it
//! becomes visible: title and body as one text payload, every image URL
//! individually. A classifier rejection marks the post rejected with the
//! classifier's reasons; a transport failure leaves it pending and
//! surfaces the error, so unscreened content is never published.

mod service;

pub use service::{Screening, ScreeningService};
