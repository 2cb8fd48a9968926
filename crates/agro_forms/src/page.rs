//! Page controller: one form input, a busy flag and the last outcome.
//!
//! A page issues at most one submission at a time. Every submission ends in
//! an [`Outcome`]; validation failures are recorded without a network call,
//! server failures surface the service's message, and everything else shows
//! the page's fixed failure message.
//!
//! A submission holds a [`Claim`] on the page for as long as it is in
//! flight. The claim references the page state weakly, so a page dropped
//! mid-flight is never updated, and it releases the busy flag when dropped,
//! so a cancelled or aborted submission does not wedge the page.

use agro_adapter::{ImageFile, Submit};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::Result;
use crate::forms::{DiseaseForm, Form};

/// What a page displays after a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Failure(String),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            Outcome::Failure(m) => Some(m),
            Outcome::Success(_) => None,
        }
    }
}

/// A submission was refused because one is already in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Busy;

/// Result of starting a background submission.
#[derive(Debug)]
pub enum Spawned {
    /// Validation failed; the outcome is already recorded.
    Invalid,
    /// Request in flight. The task yields `true` if the page was still alive
    /// to receive the outcome.
    InFlight(JoinHandle<bool>),
}

struct PageState<F: Form> {
    input: F,
    busy: bool,
    outcome: Option<Outcome<F::Response>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The in-flight hold on a page's busy flag.
struct Claim<F: Form> {
    page: Weak<Mutex<PageState<F>>>,
    settled: bool,
}

impl<F: Form> Claim<F> {
    /// Record the outcome and release the page. Returns `false` if the page
    /// is gone.
    fn settle(mut self, outcome: Outcome<F::Response>) -> bool {
        self.settled = true;
        let Some(state) = self.page.upgrade() else {
            debug!(route = F::ENDPOINT.path(), "page dropped before response; discarding");
            return false;
        };
        let mut s = lock(&state);
        s.busy = false;
        s.outcome = Some(outcome);
        true
    }
}

impl<F: Form> Drop for Claim<F> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if let Some(state) = self.page.upgrade() {
            debug!(route = F::ENDPOINT.path(), "submission abandoned; releasing page");
            lock(&state).busy = false;
        }
    }
}

pub struct Page<F: Form> {
    state: Arc<Mutex<PageState<F>>>,
    submitter: Arc<dyn Submit>,
}

pub type CropPage = Page<crate::forms::CropForm>;
pub type FertilizerPage = Page<crate::forms::FertilizerForm>;
pub type DiseasePage = Page<DiseaseForm>;
pub type YieldPage = Page<crate::forms::YieldForm>;

impl<F: Form> Page<F> {
    pub fn new(submitter: Arc<dyn Submit>) -> Self {
        Self {
            state: Arc::new(Mutex::new(PageState {
                input: F::default(),
                busy: false,
                outcome: None,
            })),
            submitter,
        }
    }

    /// Edit one text field.
    pub fn set(&self, field: &str, value: &str) -> Result<()> {
        lock(&self.state).input.set(field, value)
    }

    /// Edit the input record directly.
    pub fn update(&self, edit: impl FnOnce(&mut F)) {
        edit(&mut lock(&self.state).input);
    }

    pub fn is_busy(&self) -> bool {
        lock(&self.state).busy
    }

    pub fn outcome(&self) -> Option<Outcome<F::Response>> {
        lock(&self.state).outcome.clone()
    }

    /// Submit and wait. Returns the recorded outcome, or [`Busy`] without
    /// touching the network if a submission is already in flight. Dropping
    /// the future releases the page without recording an outcome.
    pub async fn submit(&self) -> std::result::Result<Outcome<F::Response>, Busy> {
        let (claim, request) = match begin(&self.state)? {
            Ok(claimed) => claimed,
            Err(message) => return Ok(Outcome::Failure(message)),
        };
        let outcome = resolve::<F>(self.submitter.as_ref(), request).await;
        claim.settle(outcome.clone());
        Ok(outcome)
    }

    /// Submit on a background task. The task holds the page state weakly
    /// and drops the outcome if the page is gone when the response lands.
    pub fn spawn_submit(&self) -> std::result::Result<Spawned, Busy> {
        let Ok((claim, request)) = begin(&self.state)? else {
            return Ok(Spawned::Invalid);
        };
        let submitter = Arc::clone(&self.submitter);
        Ok(Spawned::InFlight(tokio::spawn(async move {
            let outcome = resolve::<F>(submitter.as_ref(), request).await;
            claim.settle(outcome)
        })))
    }
}

impl Page<DiseaseForm> {
    /// Select an image for upload. Non-images are ignored; a new selection
    /// clears the previous outcome.
    pub fn select_image(&self, image: ImageFile) -> bool {
        let mut state = lock(&self.state);
        let taken = state.input.select(image);
        if taken {
            state.outcome = None;
        }
        taken
    }
}

type Claimed<F> = (Claim<F>, <F as Form>::Request);

/// Claim the page for a submission. An inner `Err` is the validation
/// message, already recorded as the outcome.
fn begin<F: Form>(
    state: &Arc<Mutex<PageState<F>>>,
) -> std::result::Result<std::result::Result<Claimed<F>, String>, Busy> {
    let mut s = lock(state);
    if s.busy {
        debug!(route = F::ENDPOINT.path(), "submission already in flight");
        return Err(Busy);
    }
    match s.input.request() {
        Ok(request) => {
            s.busy = true;
            let claim = Claim { page: Arc::downgrade(state), settled: false };
            Ok(Ok((claim, request)))
        }
        Err(e) => {
            let message = e.to_string();
            s.outcome = Some(Outcome::Failure(message.clone()));
            Ok(Err(message))
        }
    }
}

async fn resolve<F: Form>(submitter: &dyn Submit, request: F::Request) -> Outcome<F::Response> {
    match F::call(submitter, request).await {
        Ok(response) => Outcome::Success(response),
        Err(e) => match e.server_message() {
            Some(message) => Outcome::Failure(message.to_string()),
            None => {
                warn!(route = F::ENDPOINT.path(), error = ?e, "submission failed");
                Outcome::Failure(F::FAILURE_MESSAGE.to_string())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::{CropForm, FertilizerForm, FILL_ALL_FIELDS, NO_FILE_UPLOADED};
    use agro_adapter::{AdapterError, Body, Endpoint, TRANSPORT_MESSAGE};
    use std::time::Duration;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Records calls and answers with a fixed result, optionally waiting
    /// for a release signal first.
    struct Fake {
        calls: AtomicUsize,
        reply: fn() -> agro_adapter::Result<Value>,
        gate: Option<Arc<Notify>>,
    }

    impl Fake {
        fn new(reply: fn() -> agro_adapter::Result<Value>) -> Arc<Self> {
            Arc::new(Self { calls: AtomicUsize::new(0), reply, gate: None })
        }

        fn gated(reply: fn() -> agro_adapter::Result<Value>, gate: Arc<Notify>) -> Arc<Self> {
            Arc::new(Self { calls: AtomicUsize::new(0), reply, gate: Some(gate) })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Submit for Fake {
        async fn submit(&self, _endpoint: Endpoint, _body: Body) -> agro_adapter::Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            (self.reply)()
        }
    }

    fn rice() -> agro_adapter::Result<Value> {
        Ok(json!({"prediction": "rice", "message": "Rice is the best crop to be cultivated.", "confidence": "95%"}))
    }

    fn filled_crop(page: &CropPage) {
        for (f, v) in [
            ("nitrogen", "90"),
            ("phosphorus", "42"),
            ("potassium", "43"),
            ("temperature", "20.8"),
            ("humidity", "82"),
            ("ph", "6.5"),
            ("rainfall", "202"),
        ] {
            page.set(f, v).unwrap();
        }
    }

    #[tokio::test]
    async fn validation_failure_makes_no_call() {
        let fake = Fake::new(rice);
        let page = CropPage::new(fake.clone());
        page.set("nitrogen", "90").unwrap();
        let outcome = page.submit().await.unwrap();
        assert_eq!(outcome.failure(), Some(FILL_ALL_FIELDS));
        assert_eq!(fake.calls(), 0);
        assert!(!page.is_busy());
    }

    #[tokio::test]
    async fn success_is_recorded() {
        let fake = Fake::new(rice);
        let page = CropPage::new(fake.clone());
        filled_crop(&page);
        let Outcome::Success(r) = page.submit().await.unwrap() else {
            panic!("expected success");
        };
        assert_eq!(r.prediction.as_deref(), Some("rice"));
        assert_eq!(r.confidence.as_deref(), Some("95%"));
        assert_eq!(fake.calls(), 1);
        assert!(page.outcome().unwrap().is_success());
    }

    #[tokio::test]
    async fn server_message_is_verbatim() {
        let fake = Fake::new(|| Err(AdapterError::Server { status: 400, message: "X".into() }));
        let page = CropPage::new(fake);
        filled_crop(&page);
        assert_eq!(page.submit().await.unwrap().failure(), Some("X"));
    }

    #[tokio::test]
    async fn transport_failure_uses_page_message() {
        let fake = Fake::new(|| Err(AdapterError::Transport("connection refused".into())));
        let page = CropPage::new(fake);
        filled_crop(&page);
        let outcome = page.submit().await.unwrap();
        assert_eq!(outcome.failure(), Some(CropForm::FAILURE_MESSAGE));
        assert_ne!(outcome.failure(), Some(TRANSPORT_MESSAGE));
    }

    #[tokio::test]
    async fn non_object_success_uses_page_message() {
        let fake = Fake::new(|| Ok(json!("rice")));
        let page = FertilizerPage::new(fake);
        page.update(|f: &mut FertilizerForm| {
            f.crop = "rice".into();
            f.nitrogen = "1".into();
            f.phosphorus = "2".into();
            f.potassium = "3".into();
        });
        assert_eq!(page.submit().await.unwrap().failure(), Some(FertilizerForm::FAILURE_MESSAGE));
    }

    #[tokio::test]
    async fn second_submit_while_busy_is_refused() {
        let gate = Arc::new(Notify::new());
        let fake = Fake::gated(rice, gate.clone());
        let page = CropPage::new(fake.clone());
        filled_crop(&page);

        let Spawned::InFlight(task) = page.spawn_submit().unwrap() else {
            panic!("expected in-flight submission");
        };
        assert!(page.is_busy());
        assert_eq!(page.submit().await.unwrap_err(), Busy);
        assert!(matches!(page.spawn_submit(), Err(Busy)));

        gate.notify_one();
        assert!(task.await.unwrap());
        assert_eq!(fake.calls(), 1);
        assert!(!page.is_busy());
        assert!(page.outcome().unwrap().is_success());
    }

    #[tokio::test]
    async fn dropped_page_is_not_updated() {
        let gate = Arc::new(Notify::new());
        let fake = Fake::gated(rice, gate.clone());
        let page = CropPage::new(fake.clone());
        filled_crop(&page);

        let Spawned::InFlight(task) = page.spawn_submit().unwrap() else {
            panic!("expected in-flight submission");
        };
        drop(page);
        gate.notify_one();
        assert!(!task.await.unwrap());
        assert_eq!(fake.calls(), 1);
    }

    #[tokio::test]
    async fn spawn_with_invalid_form_records_failure() {
        let fake = Fake::new(rice);
        let page = DiseasePage::new(fake.clone());
        assert!(matches!(page.spawn_submit().unwrap(), Spawned::Invalid));
        assert_eq!(page.outcome().unwrap().failure(), Some(NO_FILE_UPLOADED));
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn new_image_clears_outcome() {
        let page = DiseasePage::new(Fake::new(rice));
        page.submit().await.unwrap();
        assert!(page.outcome().is_some());
        assert!(!page.select_image(ImageFile::new("a.txt", "text/plain", vec![])));
        assert!(page.outcome().is_some());
        assert!(page.select_image(ImageFile::new("leaf.jpg", "image/jpeg", vec![1])));
        assert!(page.outcome().is_none());
    }

    #[tokio::test]
    async fn timed_out_submit_releases_the_page() {
        let gate = Arc::new(Notify::new());
        let fake = Fake::gated(rice, gate.clone());
        let page = CropPage::new(fake.clone());
        filled_crop(&page);

        let first = tokio::time::timeout(Duration::from_millis(20), page.submit()).await;
        assert!(first.is_err());
        assert!(!page.is_busy());
        assert!(page.outcome().is_none());

        gate.notify_one();
        assert!(page.submit().await.unwrap().is_success());
        assert_eq!(fake.calls(), 2);
    }

    #[tokio::test]
    async fn aborted_background_submit_releases_the_page() {
        let gate = Arc::new(Notify::new());
        let fake = Fake::gated(rice, gate.clone());
        let page = CropPage::new(fake.clone());
        filled_crop(&page);

        let Spawned::InFlight(task) = page.spawn_submit().unwrap() else {
            panic!("expected in-flight submission");
        };
        while fake.calls() == 0 {
            tokio::task::yield_now().await;
        }
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        assert!(!page.is_busy());

        gate.notify_one();
        assert!(page.submit().await.unwrap().is_success());
        assert_eq!(fake.calls(), 2);
    }
}
