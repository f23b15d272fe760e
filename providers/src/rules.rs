//! The enumerated coding-standard rule set swept by
//! [`SweepStrategy::RuleSweep`](lintra_types::SweepStrategy::RuleSweep).
//!
//! Each entry becomes one instruction appended to the system prompt, so the
//! provider evaluates exactly one rule per request.

/// MISRA-flavored C coding-standard rules, one request per (rule x chunk).
pub const CODING_RULES: &[&str] = &[
    "Code MUST follow MISRA C Coding Guidelines.",
    "Use 4 spaces for indentation; do not use tabs.",
    "Aim for a maximum line length of 76 columns.",
    "Place the `*` directly next to the variable name for pointers (e.g., `int *ptr`).",
    "Align variable names where possible and match the style of surrounding code.",
    "Enclose the statement forming the body of control structures (`if`, `else if`, `else`, `while`, `do ... while`, `for`) in braces.",
    "An `if (expression)` construct must be followed by a compound statement; `else` must be followed by a compound statement or another `if` statement.",
    "Terminate all `if ... else if` constructs with an `else` clause.",
    "A pointer resulting from arithmetic on a pointer operand must address an element of the same array as that pointer operand.",
    "Do not use the `sizeof` operator on function parameters declared as \"array of type\".",
    "Do not use the Standard Library function `system` from `<stdlib.h>`.",
    "Follow alignment (`<stdalign.h>`) and no-return functions (`<stdnoreturn.h>`) rules.",
    "Do not use type generic expressions (`_Generic`).",
    "Avoid using obsolescent language features.",
    "Declare all variables at the beginning of a block.",
    "Avoid using global variables; prefer static variables.",
    "Use only approved control structures; avoid `goto` statements.",
    "Ensure all loops have a fixed upper limit.",
    "Keep functions short and focused on a single task.",
    "Use function prototypes and limit the number of parameters.",
    "Use only standard MISRA-compliant data types.",
    "Avoid dynamic memory allocation (`malloc`, `calloc`, `free`).",
    "Use consistent comment styles:\n  - Single-line: `/* Comment */`\n  - Multi-line:\n    ```\n    /*\n     * Multi-line comment\n     * continues here.\n     */\n    ```",
    "Describe the intent, not the action; use full sentences, correct grammar, and spelling. Avoid non-obvious abbreviations.",
    "Use K&R style for bracing; always brace even single-line statements.",
    "Use a single exit point in functions, using `goto` for error handling.",
    "Wrap non-trivial macros in `do {...} while (0)`.",
    "Avoid magic numbers; use enumerations or constants.",
    "Define bitfield widths for `BOOL`, enums, and flags to ensure proper alignment.",
];
