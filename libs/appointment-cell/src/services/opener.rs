// libs/appointment-cell/src/services/opener.rs

/// Platform hook that opens a join URL in a new window or tab.
///
/// Fire-and-forget: nothing is reported back to the caller.
pub trait JoinTargetOpener: Send + Sync {
    fn open(&self, url: &str);
}

impl<F> JoinTargetOpener for F
where
    F: Fn(&str) + Send + Sync,
{
    fn open(&self, url: &str) {
        self(url)
    }
}
