//! Google Translate text-to-speech clips.

/// Longest text Google Translate will speak in a single request.
pub const MAX_CHUNK_CHARS: usize = 200;

const TTS_HOST: &str = "https://translate.google.com";

/// Splits `text` into chunks of at most [`MAX_CHUNK_CHARS`] characters,
/// packing whole words greedily. Words longer than a chunk are split.
pub fn split_text(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word;

        while word.chars().count() > MAX_CHUNK_CHARS {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let cut = word
                .char_indices()
                .nth(MAX_CHUNK_CHARS)
                .map_or(word.len(), |(idx, _)| idx);
            chunks.push(word[..cut].to_string());
            word = &word[cut..];
        }

        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > MAX_CHUNK_CHARS {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Builds one TTS URL per chunk of `text`.
pub fn audio_urls(text: &str, language: &str) -> Vec<String> {
    split_text(text)
        .iter()
        .map(|chunk| chunk_url(chunk, language))
        .collect()
}

fn chunk_url(chunk: &str, language: &str) -> String {
    format!(
        "{}/translate_tts?ie=UTF-8&q={}&tl={}&total=1&idx=0&textlen={}&client=tw-ob&prev=input&ttsspeed=1",
        TTS_HOST,
        urlencoding::encode(chunk),
        urlencoding::encode(language),
        chunk.chars().count(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_text("  hello   there  "), vec!["hello there"]);
        assert!(split_text("   ").is_empty());
    }

    #[test]
    fn long_text_packs_whole_words() {
        let text = "word ".repeat(100);
        let chunks = split_text(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= MAX_CHUNK_CHARS);
            assert!(chunk.split(' ').all(|w| w == "word"));
        }
        assert_eq!(chunks.join(" "), text.trim());
    }

    #[test]
    fn oversized_word_is_split() {
        let word = "a".repeat(450);
        let chunks = split_text(&format!("hi {} bye", word));

        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0], "hi");
        assert_eq!(chunks[1].len(), 200);
        assert_eq!(chunks[2].len(), 200);
        assert_eq!(chunks[3], "a".repeat(50) + " bye");
    }

    #[test]
    fn urls_are_encoded() {
        let urls = audio_urls("hola señor", "es");
        assert_eq!(urls.len(), 1);
        assert!(urls[0].starts_with("https://translate.google.com/translate_tts?"));
        assert!(urls[0].contains("q=hola%20se%C3%B1or"));
        assert!(urls[0].contains("tl=es"));
        assert!(urls[0].contains("textlen=10"));
    }
}
