//! Script phase: rewrite each chunk as a single-narrator podcast script.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use llm_client::{LlmProvider, LlmRequest};
use std::fs;
use std::path::{Path, PathBuf};

const SYSTEM_PROMPT: &str =
    "You write scripts for a single podcast host. Reply with the spoken script only.";

const FALLBACK_OPENING: &str = "Hello everyone. Today we will talk about the following.";
const FALLBACK_CLOSING: &str = "That is all for this episode. Thank you for listening.";

/// Sentences longer than this are split once near the middle.
const LONG_SENTENCE_CHARS: usize = 100;
/// How far from the middle a comma may sit to be used as the split point.
const SPLIT_WINDOW: usize = 20;

/// Build the rewrite request for one chunk.
pub fn build_script_prompt(text: &str, style: &str) -> String {
    format!(
        r#"Rewrite the text below as a script for one person speaking on a podcast.

Requirements:
1. Stay faithful to the content while explaining it clearly for listeners.
2. Use natural, polite spoken language.
3. Add a short explanation for technical terms.
4. Keep the tone {style}.
5. Address the listeners directly ("everyone", "what matters here is").
6. Break long sentences into short ones that are easy to follow.

Text:
{text}

Script:"#
    )
}

/// Clean a model reply: drop blank, heading and bullet lines, then separate
/// the remaining lines with blank lines.
pub fn post_process(reply: &str) -> String {
    let reply = reply.replace("。。", "。").replace("、、", "、");

    reply
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('*'))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Narration built from the chunk alone: an opening line, one sentence per
/// block with long sentences split at a comma near the middle, and a closing.
pub fn fallback_script(text: &str) -> String {
    let mut parts = vec![FALLBACK_OPENING.to_string()];

    for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        for sentence in split_sentences(paragraph) {
            parts.extend(split_long_sentence(sentence));
        }
    }

    parts.push(FALLBACK_CLOSING.to_string());
    parts.join("\n\n")
}

/// Sentences of a paragraph, each keeping its terminator.
///
/// `。！？` always end a sentence; `.!?` only before whitespace or the end,
/// so decimals and abbreviations inside words stay intact.
fn split_sentences(paragraph: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = paragraph.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let boundary = match c {
            '。' | '！' | '？' => true,
            '.' | '!' | '?' => chars.peek().is_none_or(|(_, next)| next.is_whitespace()),
            _ => false,
        };
        if boundary {
            let end = i + c.len_utf8();
            push_trimmed(&mut sentences, &paragraph[start..end]);
            start = end;
        }
    }
    push_trimmed(&mut sentences, &paragraph[start..]);

    sentences
}

fn push_trimmed<'a>(sentences: &mut Vec<&'a str>, sentence: &'a str) {
    let sentence = sentence.trim();
    if !sentence.is_empty() {
        sentences.push(sentence);
    }
}

fn split_long_sentence(sentence: &str) -> Vec<String> {
    let chars: Vec<char> = sentence.chars().collect();
    if chars.len() <= LONG_SENTENCE_CHARS {
        return vec![sentence.to_string()];
    }

    let mid = chars.len() / 2;
    let window = mid.saturating_sub(SPLIT_WINDOW)..(mid + SPLIT_WINDOW).min(chars.len());
    match window.into_iter().find(|&i| matches!(chars[i], '、' | ',')) {
        Some(split) if split > 0 => {
            let head: String = chars[..=split].iter().collect();
            let tail: String = chars[split + 1..].iter().collect();
            [head, tail]
                .into_iter()
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect()
        }
        _ => vec![sentence.to_string()],
    }
}

/// Produce the script for one chunk.
///
/// When the provider gives up, or replies with nothing usable, the script is
/// built from the chunk text by [`fallback_script`].
pub async fn generate_script(provider: &dyn LlmProvider, text: &str, style: &str) -> String {
    let request = LlmRequest::new(build_script_prompt(text, style)).with_system_prompt(SYSTEM_PROMPT);

    match provider.complete(request).await {
        Ok(response) => {
            let script = post_process(&response.content);
            if script.is_empty() {
                log::warn!("Model returned an empty script; using fallback narration");
                fallback_script(text)
            } else {
                script
            }
        }
        Err(e) => {
            log::warn!("Script generation failed ({}); using fallback narration", e);
            fallback_script(text)
        }
    }
}

/// Generate `script_{i}.txt` in `output_dir` for each chunk file, in order.
pub async fn process_chunks(
    provider: &dyn LlmProvider,
    chunk_files: &[PathBuf],
    style: &str,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    if chunk_files.is_empty() {
        anyhow::bail!("No chunk files to turn into scripts. Run the split phase first.");
    }

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create script directory {}", output_dir.display()))?;

    log::info!("Processing {} chunks for script generation", chunk_files.len());

    let pb = ProgressBar::new(chunk_files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("#>-"),
    );

    let mut output_paths = Vec::with_capacity(chunk_files.len());
    for (index, chunk_file) in chunk_files.iter().enumerate() {
        let id = index + 1;
        pb.set_message(format!("chunk {}", id));

        if !chunk_file.exists() {
            log::warn!("Chunk file not found: {}", chunk_file.display());
            pb.inc(1);
            continue;
        }

        let text = fs::read_to_string(chunk_file)
            .with_context(|| format!("Failed to read {}", chunk_file.display()))?;
        let script = generate_script(provider, &text, style).await;

        let output_path = output_dir.join(format!("script_{}.txt", id));
        fs::write(&output_path, &script)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;

        log::info!("Generated script {}: {} characters", id, script.chars().count());
        output_paths.push(output_path);
        pb.inc(1);
    }

    pb.finish_with_message("done");
    Ok(output_paths)
}
