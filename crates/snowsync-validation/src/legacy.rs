//! Legacy-syntax detection for server-side scripts
//!
//! Server-side script fields run on an ES5 engine. [`LegacySyntaxChecker`]
//! flags ES2015+ constructs line by line. Findings are advisory.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// ES2015+ construct that the server-side engine rejects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyConstruct {
    /// `let x = ...`
    LetDeclaration,
    /// `const x = ...`
    ConstDeclaration,
    /// `(a) => ...`
    ArrowFunction,
    /// `` `${x}` ``
    TemplateLiteral,
    /// `...args`
    SpreadSyntax,
    /// `class Foo {}`
    ClassDeclaration,
    /// `async function f() {}`
    AsyncFunction,
    /// `for (x of xs)`
    ForOfLoop,
}

impl LegacyConstruct {
    /// Every construct, in reporting order
    pub const ALL: [LegacyConstruct; 8] = [
        Self::LetDeclaration,
        Self::ConstDeclaration,
        Self::ArrowFunction,
        Self::TemplateLiteral,
        Self::SpreadSyntax,
        Self::ClassDeclaration,
        Self::AsyncFunction,
        Self::ForOfLoop,
    ];

    /// Short identifier
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::LetDeclaration => "let",
            Self::ConstDeclaration => "const",
            Self::ArrowFunction => "arrow-function",
            Self::TemplateLiteral => "template-literal",
            Self::SpreadSyntax => "spread",
            Self::ClassDeclaration => "class",
            Self::AsyncFunction => "async-function",
            Self::ForOfLoop => "for-of",
        }
    }

    /// Human-readable description with the ES5 replacement
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::LetDeclaration => "let declaration is block-scoped (ES2015); use var",
            Self::ConstDeclaration => "const declaration is block-scoped (ES2015); use var",
            Self::ArrowFunction => "arrow function (ES2015); use a function expression",
            Self::TemplateLiteral => {
                "template literal interpolation (ES2015); use string concatenation"
            }
            Self::SpreadSyntax => "spread syntax (ES2015); use apply() or an explicit loop",
            Self::ClassDeclaration => {
                "class declaration (ES2015); use Class.create() or prototypes"
            }
            Self::AsyncFunction => "async function (ES2017); not supported server-side",
            Self::ForOfLoop => "for-of loop (ES2015); use an indexed for loop",
        }
    }

    fn pattern(self) -> &'static Regex {
        &PATTERNS[self as usize]
    }
}

impl fmt::Display for LegacyConstruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Indexed by `LegacyConstruct as usize`.
static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\blet\s+[A-Za-z_$\[{]",
        r"\bconst\s+[A-Za-z_$\[{]",
        r"(?:\([^()]*\)|[A-Za-z_$][\w$]*)\s*=>",
        r"`[^`]*\$\{",
        r"\.\.\.\s*[A-Za-z_$\[{(]",
        r"\bclass\s+[A-Za-z_$]",
        r"\basync\s+function\b",
        r"\bfor\s*\(\s*(?:var|let|const)?\s*[A-Za-z_$][\w$]*\s+of\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("legacy syntax pattern is valid"))
    .collect()
});

const MAX_SNIPPET: usize = 120;

/// One legacy construct found in a script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacySyntaxIssue {
    /// Construct detected
    pub construct: LegacyConstruct,
    /// 1-based line number
    pub line: usize,
    /// Offending source line, trimmed
    pub snippet: String,
}

impl LegacySyntaxIssue {
    /// Message naming the construct and where it was found
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "line {}: {} ({})",
            self.line,
            self.construct.description(),
            self.snippet
        )
    }
}

impl fmt::Display for LegacySyntaxIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Line-oriented scanner for ES2015+ constructs
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacySyntaxChecker;

impl LegacySyntaxChecker {
    /// Scan a script and report every construct per line
    ///
    /// Line and block comments are ignored. A construct is reported at most
    /// once per line.
    #[must_use]
    pub fn check(source: &str) -> Vec<LegacySyntaxIssue> {
        let mut issues = Vec::new();
        let mut in_block_comment = false;

        for (index, line) in source.lines().enumerate() {
            let code = code_portion(line, &mut in_block_comment);
            if code.trim().is_empty() {
                continue;
            }
            for construct in LegacyConstruct::ALL {
                if construct.pattern().is_match(&code) {
                    issues.push(LegacySyntaxIssue {
                        construct,
                        line: index + 1,
                        snippet: snippet(line),
                    });
                }
            }
        }

        issues
    }

    /// True when the script has no legacy-incompatible construct
    #[must_use]
    pub fn is_compatible(source: &str) -> bool {
        Self::check(source).is_empty()
    }
}

/// Strip comments from one line, tracking block comments across lines.
/// Bodies of `'...'` and `"..."` strings are blanked, quotes kept, so
/// neither `'http://...'` nor prose like `'let me know'` is read as code.
fn code_portion(line: &str, in_block: &mut bool) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(ch) = chars.next() {
        if *in_block {
            if ch == '*' && chars.peek() == Some(&'/') {
                chars.next();
                *in_block = false;
            }
            continue;
        }
        if let Some(q) = quote {
            if ch == q {
                out.push(ch);
                quote = None;
            } else {
                out.push(' ');
                if ch == '\\' && chars.next().is_some() {
                    out.push(' ');
                }
            }
            continue;
        }
        match ch {
            '/' if chars.peek() == Some(&'/') => break,
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                *in_block = true;
            }
            '\'' | '"' => {
                quote = Some(ch);
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }

    out
}

fn snippet(line: &str) -> String {
    let trimmed = line.trim();
    if trimmed.chars().count() <= MAX_SNIPPET {
        trimmed.to_string()
    } else {
        let mut cut: String = trimmed.chars().take(MAX_SNIPPET).collect();
        cut.push('…');
        cut
    }
}
