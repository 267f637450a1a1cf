use crate::graphql::ClientError;

/// A snapshot of one remotely loaded value.
///
/// `data` is never absent: while the first load is in flight, or after a failed
/// one, it holds the empty default. A reload keeps the previous data until the new
/// response arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct Loadable<D> {
    pub data: D,
    pub loading: bool,
    pub error: Option<String>,
}

impl<D: Default> Default for Loadable<D> {
    fn default() -> Self {
        Self {
            data: D::default(),
            loading: false,
            error: None,
        }
    }
}

impl<T> Loadable<Vec<T>> {
    pub fn items(&self) -> &[T] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<D: Default> Loadable<D> {
    pub(crate) fn start(&mut self) {
        self.loading = true;
    }

    /// Applies the outcome of a load. `Ok(None)` means the load was skipped for lack
    /// of an organization, which leaves an empty, error-free snapshot.
    pub(crate) fn settle(&mut self, what: &str, result: Result<Option<D>, ClientError>) {
        self.loading = false;
        match result {
            Ok(Some(data)) => {
                self.data = data;
                self.error = None;
            }
            Ok(None) => *self = Self::default(),
            Err(e) => {
                tracing::error!("Error loading {}: {}", what, e);
                self.data = D::default();
                self.error = Some(e.to_string());
            }
        }
    }
}
