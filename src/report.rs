/// Sink for progress messages of the resolution core.
///
/// The core never prints by itself; the binary plugs in a console reporter and
/// tests plug in one that records messages.
pub trait Reporter {
    fn info(&self, msg: &str);
    /// Only interesting with `--verbose`
    fn verbose(&self, msg: &str);
    fn warn(&self, msg: &str);
}
