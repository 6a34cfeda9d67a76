use crate::entries::EntryService;

#[derive(Clone)]
pub(crate) struct ServerState {
    pub(crate) service: EntryService,
    /// URL prefix stored images are served under, e.g. `/images`.
    pub(crate) image_context: String,
}
