//! Levenshtein edit scripts and bounded-edit substring search.
//!
//! The mapping engine depends on one property of the opcode stream: for
//! matching character pairs at a run boundary the script reads Equal before
//! Insert before Replace, and a duplicated letter keeps its first occurrence
//! (Equal before Delete). The backtrace below encodes that ordering
//! explicitly, so the engine never needs a normalisation pass.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpTag {
    Equal,
    Insert,
    Replace,
    Delete,
}

/// One block of the edit script, python-difflib style:
/// `src[src_start..src_end]` maps to `dst[dst_start..dst_end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub tag: OpTag,
    pub src_start: usize,
    pub src_end: usize,
    pub dst_start: usize,
    pub dst_end: usize,
}

/// Edit script between two codepoint slices.
///
/// Backtrace priority at equal cost is Delete, then Replace, then Insert,
/// then Equal. Walking from the tail, that pins matched characters to their
/// earliest possible positions in both strings, which is exactly the
/// "Equal, Insert, Replace" forward ordering the mapping engine dispatches
/// on.
pub fn opcodes(src: &[char], dst: &[char]) -> Vec<Opcode> {
    let n = src.len();
    let m = dst.len();

    let width = m + 1;
    let mut d = vec![0u32; (n + 1) * width];
    for j in 0..=m {
        d[j] = j as u32;
    }
    for i in 1..=n {
        d[i * width] = i as u32;
        for j in 1..=m {
            let cost = u32::from(src[i - 1] != dst[j - 1]);
            let diag = d[(i - 1) * width + j - 1] + cost;
            let up = d[(i - 1) * width + j] + 1;
            let left = d[i * width + j - 1] + 1;
            d[i * width + j] = diag.min(up).min(left);
        }
    }

    // Unit steps, collected tail-first.
    let mut steps: Vec<(OpTag, usize, usize)> = Vec::with_capacity(n + m);
    let mut i = n;
    let mut j = m;
    while i > 0 || j > 0 {
        let here = d[i * width + j];
        if i > 0 && d[(i - 1) * width + j] + 1 == here {
            steps.push((OpTag::Delete, i - 1, j));
            i -= 1;
        } else if i > 0 && j > 0 && src[i - 1] != dst[j - 1] && d[(i - 1) * width + j - 1] + 1 == here
        {
            steps.push((OpTag::Replace, i - 1, j - 1));
            i -= 1;
            j -= 1;
        } else if j > 0 && d[i * width + j - 1] + 1 == here {
            steps.push((OpTag::Insert, i, j - 1));
            j -= 1;
        } else {
            debug_assert!(i > 0 && j > 0 && src[i - 1] == dst[j - 1]);
            steps.push((OpTag::Equal, i - 1, j - 1));
            i -= 1;
            j -= 1;
        }
    }
    steps.reverse();

    // Group unit steps into blocks.
    let mut out: Vec<Opcode> = Vec::new();
    for (tag, si, dj) in steps {
        let (src_start, dst_start) = (si, dj);
        let (src_end, dst_end) = match tag {
            OpTag::Equal | OpTag::Replace => (si + 1, dj + 1),
            OpTag::Insert => (si, dj + 1),
            OpTag::Delete => (si + 1, dj),
        };
        match out.last_mut() {
            Some(last) if last.tag == tag && last.src_end == src_start && last.dst_end == dst_start =>
            {
                last.src_end = src_end;
                last.dst_end = dst_end;
            }
            _ => out.push(Opcode {
                tag,
                src_start,
                src_end,
                dst_start,
                dst_end,
            }),
        }
    }
    out
}

/// A fuzzy occurrence of the needle inside the haystack;
/// `haystack[start..end]` is within `dist` edits of the needle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NearMatch {
    pub start: usize,
    pub end: usize,
    pub dist: u32,
}

/// All substrings of `haystack` within `max_dist` Levenshtein edits of
/// `needle`. Overlapping candidate end positions collapse to the best one
/// per run, so each real occurrence reports once.
pub fn find_near_matches(needle: &[char], haystack: &[char], max_dist: u32) -> Vec<NearMatch> {
    if needle.is_empty() || haystack.is_empty() {
        return Vec::new();
    }

    // Sellers: distance to the best-ending substring, free start anywhere.
    // Each cell carries the start index of the substring it scores.
    let m = haystack.len();
    let mut prev: Vec<(u32, usize)> = (0..=m).map(|j| (0, j)).collect();
    let mut curr: Vec<(u32, usize)> = vec![(0, 0); m + 1];
    for (i, &nc) in needle.iter().enumerate() {
        curr[0] = (i as u32 + 1, 0);
        for j in 1..=m {
            let cost = u32::from(nc != haystack[j - 1]);
            let mut best = (prev[j - 1].0 + cost, prev[j - 1].1);
            let up = (prev[j].0 + 1, prev[j].1);
            if up.0 < best.0 {
                best = up;
            }
            let left = (curr[j - 1].0 + 1, curr[j - 1].1);
            if left.0 < best.0 {
                best = left;
            }
            curr[j] = best;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let mut matches = Vec::new();
    let mut run_best: Option<NearMatch> = None;
    for j in 1..=m {
        let (dist, start) = prev[j];
        if dist <= max_dist && j > start {
            let candidate = NearMatch {
                start,
                end: j,
                dist,
            };
            run_best = Some(match run_best {
                Some(best) if best.dist <= candidate.dist => best,
                _ => candidate,
            });
        } else if let Some(best) = run_best.take() {
            matches.push(best);
        }
    }
    if let Some(best) = run_best {
        matches.push(best);
    }
    matches
}
