// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use glob::{MatchOptions, Pattern, PatternError};
use thiserror::Error;

/// 通配符编译错误
#[derive(Error, Debug)]
pub enum GlobError {
    #[error("invalid pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: PatternError,
    },
    #[error("unbalanced braces in pattern `{0}`")]
    UnbalancedBrace(String),
}

/// 通配符集合
///
/// 在 `glob::Pattern` 之上支持 `{a,b}` 备选语法，任一展开结果匹配即视为匹配。
/// `*` 可以跨越 `/`，因此 `feature/*` 同时匹配 `feature/a/b`。
#[derive(Debug, Clone)]
pub struct GlobSet {
    patterns: Vec<Pattern>,
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

impl GlobSet {
    /// 编译通配符表达式
    pub fn compile(pattern: &str) -> Result<Self, GlobError> {
        let patterns = expand_braces(pattern)?
            .into_iter()
            .map(|expanded| {
                Pattern::new(&expanded).map_err(|source| GlobError::Pattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// 判断输入是否匹配
    pub fn matches(&self, input: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| pattern.matches_with(input, MATCH_OPTIONS))
    }
}

/// 展开 `{a,b}` 备选语法，支持嵌套
fn expand_braces(pattern: &str) -> Result<Vec<String>, GlobError> {
    let Some(open) = pattern.find('{') else {
        if pattern.contains('}') {
            return Err(GlobError::UnbalancedBrace(pattern.to_string()));
        }
        return Ok(vec![pattern.to_string()]);
    };

    let mut depth = 0usize;
    let mut close = None;
    let mut splits = Vec::new();
    for (idx, ch) in pattern[open..].char_indices() {
        let idx = open + idx;
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(idx);
                    break;
                }
            }
            ',' if depth == 1 => splits.push(idx),
            _ => {}
        }
    }
    let close = close.ok_or_else(|| GlobError::UnbalancedBrace(pattern.to_string()))?;

    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];
    let mut start = open + 1;
    let mut alternatives = Vec::new();
    for split in splits.into_iter().chain(std::iter::once(close)) {
        alternatives.push(&pattern[start..split]);
        start = split + 1;
    }

    let mut expanded = Vec::new();
    for alternative in alternatives {
        let candidate = format!("{}{}{}", prefix, alternative, suffix);
        expanded.extend(expand_braces(&candidate)?);
    }
    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_globs() {
        let set = GlobSet::compile("feature/*").unwrap();
        assert!(set.matches("feature/7791"));
        assert!(set.matches("feature/a/b"));
        assert!(!set.matches("fix_weird_bug"));
    }

    #[test]
    fn test_brace_alternatives() {
        let set = GlobSet::compile("{master,release*}").unwrap();
        assert!(set.matches("master"));
        assert!(set.matches("release-1.2"));
        assert!(!set.matches("main"));

        let nested = GlobSet::compile("{a,b{c,d}}x").unwrap();
        assert!(nested.matches("ax"));
        assert!(nested.matches("bdx"));
        assert!(!nested.matches("bx"));
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(GlobSet::compile("{main").is_err());
        assert!(GlobSet::compile("main}").is_err());
        assert!(GlobSet::compile("[z-").is_err());
    }
}
