//! Form pages for the agro client.
//!
//! A page owns one form input, validates and coerces it, and hands the
//! result to a [`Submit`](agro_adapter::Submit) implementation. What a
//! complete form looks like is decided here, never in the adapter.

pub mod catalog;
pub mod error;
pub mod forms;
pub mod page;

pub use error::{FormError, Result};
pub use forms::{CropForm, DiseaseForm, FertilizerForm, Form, YieldForm};
pub use page::{Busy, CropPage, DiseasePage, FertilizerPage, Outcome, Page, Spawned, YieldPage};
