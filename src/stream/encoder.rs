use crate::models::StreamEvent;
use crate::stream::decoder::DATA_PREFIX;

/// Frames one event as a server-sent-event block: `data: <json>\n\n`.
pub fn encode_event(event: &StreamEvent) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(event)?;
    Ok(format!("{DATA_PREFIX}{json}\n\n"))
}

/// Splits a reply into word tokens the way the backend streams them:
/// the first word bare, each following word with one leading space.
pub fn word_tokens(text: &str) -> Vec<String> {
    text.split(' ')
        .enumerate()
        .map(|(i, word)| if i == 0 { word.to_string() } else { format!(" {word}") })
        .collect()
}
