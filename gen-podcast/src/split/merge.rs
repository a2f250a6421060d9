//! Post-pass that folds undersized chunks into their neighbours.

use super::Chunk;

/// Merge chunks shorter than `min_chars` forward into the next chunk.
///
/// A short final remainder is folded back into the previous chunk instead.
/// Order and content are preserved; merged texts are joined by a paragraph
/// separator. Every output chunk reaches `min_chars` unless the whole input
/// was shorter than that. Applying this twice gives the same result as once.
pub fn merge_small_chunks(chunks: Vec<Chunk>, min_chars: usize) -> Vec<Chunk> {
    let mut chunks = chunks.into_iter();
    let Some(mut current) = chunks.next() else {
        return Vec::new();
    };

    let mut merged: Vec<Chunk> = Vec::new();

    for next in chunks {
        if current.char_count() < min_chars {
            current.absorb(next);
        } else {
            merged.push(std::mem::replace(&mut current, next));
        }
    }

    match merged.last_mut() {
        Some(last) if current.char_count() < min_chars => last.absorb(current),
        _ => merged.push(current),
    }

    merged
}
