//! TwiML documents.

/// Path of the media stream WebSocket endpoint.
pub const MEDIA_STREAM_PATH: &str = "/media-stream";

/// `wss://` URL of the media stream endpoint on `host`.
pub fn media_stream_url(host: &str) -> String {
    format!("wss://{host}{MEDIA_STREAM_PATH}")
}

/// TwiML that connects the call audio to a bidirectional media stream.
pub fn connect_stream(stream_url: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <Response>\n  \
         <Connect>\n    \
         <Stream url=\"{}\" />\n  \
         </Connect>\n\
         </Response>\n",
        escape_xml(stream_url)
    )
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
