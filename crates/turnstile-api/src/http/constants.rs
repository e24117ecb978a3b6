use turnstile_outbound::MAX_UPLOAD_BYTES;

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";
pub(crate) const BEARER_PREFIX: &str = "Bearer ";

/// Request body cap for `POST /upload`: base64 of the largest file plus JSON framing.
pub(crate) const MAX_UPLOAD_BODY_BYTES: usize = MAX_UPLOAD_BYTES.div_ceil(3) * 4 + 64 * 1024;

pub(crate) const PROBLEM_INTERNAL: &str = "https://turnstile.dev/problems/internal";
pub(crate) const PROBLEM_UNAUTHORIZED: &str = "https://turnstile.dev/problems/unauthorized";
pub(crate) const PROBLEM_FORBIDDEN: &str = "https://turnstile.dev/problems/forbidden";
pub(crate) const PROBLEM_BAD_REQUEST: &str = "https://turnstile.dev/problems/bad-request";
pub(crate) const PROBLEM_NOT_FOUND: &str = "https://turnstile.dev/problems/not-found";
pub(crate) const PROBLEM_CONFLICT: &str = "https://turnstile.dev/problems/conflict";
