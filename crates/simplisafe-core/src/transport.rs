use simplisafe_api::VendorRequest;

/// Fire-and-forget request delivery.
///
/// `send` must return immediately. The completion comes back later as a
/// separate event carrying `request.kind`, delivered to
/// [`Controller::on_http_response`](crate::Controller::on_http_response) or
/// [`Controller::on_http_failure`](crate::Controller::on_http_failure).
pub trait Transport {
    fn send(&mut self, request: VendorRequest);
}
