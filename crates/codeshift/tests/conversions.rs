//! Whole-program conversion tests.
//!
//! Snapshots are inline; run `cargo insta review` after intentional changes
//! to rule output.

use codeshift::{
    ConversionCoordinator, ConversionLevel, ConversionResult, ConvertError, ConvertOptions,
    Severity,
};

fn convert(code: &str, from: &str, to: &str) -> ConversionResult {
    ConversionCoordinator::new(ConvertOptions::default())
        .convert(code, from, to, false)
        .expect("conversion rejected")
}

fn to_javascript(lines: &[&str]) -> ConversionResult {
    convert(&lines.join("\n"), "python", "javascript")
}

fn to_python(lines: &[&str]) -> ConversionResult {
    convert(&lines.join("\n"), "javascript", "python")
}

fn brace_counts(code: &str) -> (usize, usize) {
    (code.matches('{').count(), code.matches('}').count())
}

// ============================================================================
// python -> javascript
// ============================================================================

mod python_to_javascript {
    use super::*;

    #[test]
    fn class_with_methods() {
        let result = to_javascript(&[
            "class Dog(Animal):",
            "    def __init__(self, name):",
            "        self.name = name",
            "",
            "    def speak(self):",
            "        return f\"{self.name} barks\"",
        ]);
        insta::assert_snapshot!(result.code, @r"
        class Dog extends Animal {
          constructor(name) {
            this.name = name;
          }

          speak() {
            return `${this.name} barks`;
          }
        }
        ");
        assert_eq!(result.level, ConversionLevel::Structural);
    }

    #[test]
    fn loop_accumulator() {
        let result = to_javascript(&[
            "def total(items):",
            "    result = 0",
            "    for item in items:",
            "        if item > 0:",
            "            result += item",
            "    return result",
        ]);
        insta::assert_snapshot!(result.code, @r"
        function total(items) {
          let result = 0;
          for (let item of items) {
            if (item > 0) {
              result += item;
            }
          }
          return result;
        }
        ");
        assert_eq!(result.level, ConversionLevel::Complex);
        assert_eq!(result.metadata.blocks_opened, 3);
        assert_eq!(result.metadata.max_depth, 3);
    }

    #[test]
    fn unsupported_constructs_are_listed() {
        let result = to_javascript(&["with open(path) as fh:", "    data = fh.read()"]);
        insta::assert_json_snapshot!(result.unsupported, @r#"
        [
          {
            "line": 1,
            "construct": "with",
            "severity": "error",
            "detail": "context managers have no JavaScript equivalent"
          }
        ]
        "#);
        assert_eq!(result.error_count, 1);
    }

    #[test]
    fn multi_line_literals_stay_open() {
        let result = to_javascript(&[
            "config = {",
            "    'debug': True,",
            "}",
            "total = add(a,",
            "    b)",
            "print(total)",
        ]);
        let lines: Vec<&str> = result.code.lines().map(str::trim).collect();
        assert_eq!(lines[0], "let config = {");
        assert_eq!(lines[1], "'debug': true,");
        assert_eq!(lines[3], "let total = add(a,");
        assert_eq!(lines[5], "console.log(total);");
        assert!(!result.code.contains("{;"), "{}", result.code);
        assert!(!result.code.contains(",;"), "{}", result.code);
    }

    #[test]
    fn inline_lambdas_are_flagged() {
        let result = to_javascript(&[
            "items.sort(key=lambda p: p[1])",
            "total = apply(lambda a, b: a + b, xs)",
            "double = lambda x: x * 2",
        ]);
        let flagged: Vec<(usize, &str)> = result
            .unsupported
            .iter()
            .map(|u| (u.line, u.construct.as_str()))
            .collect();
        assert_eq!(flagged, [(1, "lambda"), (2, "lambda")]);
        assert!(result.code.ends_with("let double = x => x * 2;"));
    }

    #[test]
    fn super_constructor_call() {
        let result = to_javascript(&[
            "class Dog(Animal):",
            "    def __init__(self, name):",
            "        super().__init__(name)",
        ]);
        assert!(result.code.contains("    super(name);"), "{}", result.code);
    }

    #[test]
    fn binding_scenario() {
        let result = convert("x = 5", "python", "javascript");
        assert!(result.code.contains("let x = 5"));
        assert!(result.confidence > 0.7, "confidence = {}", result.confidence);
    }
}

// ============================================================================
// javascript -> python
// ============================================================================

mod javascript_to_python {
    use super::*;

    #[test]
    fn class_with_methods() {
        let result = to_python(&[
            "class Counter {",
            "  constructor(start) {",
            "    this.count = start;",
            "  }",
            "",
            "  increment() {",
            "    this.count++;",
            "    console.log(`count is ${this.count}`);",
            "  }",
            "}",
        ]);
        insta::assert_snapshot!(result.code, @r#"
        class Counter:
            def __init__(self, start):
                self.count = start

            def increment(self):
                self.count += 1
                print(f"count is {self.count}")
        "#);
        assert_eq!(result.error_count, 0);
    }

    #[test]
    fn counting_loop() {
        let result = to_python(&[
            "function sumTo(n) {",
            "  let total = 0;",
            "  for (let i = 1; i <= n; i++) {",
            "    total += i;",
            "  }",
            "  return total;",
            "}",
        ]);
        insta::assert_snapshot!(result.code, @r"
        def sumTo(n):
            total = 0
            for i in range(1, n + 1):
                total += i
            return total
        ");
        assert_eq!(result.level, ConversionLevel::Complex);
    }

    #[test]
    fn super_constructor_call() {
        let result = to_python(&[
            "class Dog extends Animal {",
            "  constructor(name) {",
            "    super(name);",
            "  }",
            "}",
        ]);
        insta::assert_snapshot!(result.code, @r"
        class Dog(Animal):
            def __init__(self, name):
                super().__init__(name)
        ");
    }

    #[test]
    fn block_arrow_callback_is_kept() {
        let result = to_python(&[
            "xs.forEach((a, b) => {",
            "  f(a);",
            "});",
            "run(() => tick());",
        ]);
        assert_eq!(
            result.code,
            "xs.forEach((a, b) => {\n    f(a)\n});\nrun(() => tick())"
        );
        assert!(!result.code.contains("=>:"));
        let flagged: Vec<(usize, &str)> = result
            .unsupported
            .iter()
            .map(|u| (u.line, u.construct.as_str()))
            .collect();
        assert_eq!(flagged, [(1, "arrow function"), (4, "arrow function")]);
    }

    #[test]
    fn switch_is_an_error_but_converts() {
        let result = to_python(&["switch (kind) {", "  case 1:", "    run();", "}"]);
        assert_eq!(result.error_count, 1);
        assert_eq!(result.unsupported[0].severity, Severity::Error);
        assert!(result.code.starts_with("switch (kind):"));
    }
}

// ============================================================================
// Delimiter reconstruction
// ============================================================================

mod closing_braces {
    use super::*;

    const PROGRAMS: &[&[&str]] = &[
        &["if x > 5:", "    print(x)", "print('done')"],
        &[
            "if x > 0:",
            "    if y > 0:",
            "        print('both')",
            "    print('x')",
            "print('done')",
        ],
        &["def greet(name):", "    print(f'Hello {name}')", "    return name"],
        &["for i in range(5):", "    print(i)", "print('done')"],
        &[
            "if x > 10:",
            "    print('large')",
            "elif x > 5:",
            "    print('medium')",
            "else:",
            "    print('small')",
            "print('done')",
        ],
        &["while x > 0:", "    print(x)", "    x = x - 1", "print('done')"],
        &[
            "try:",
            "    x = 1 / 0",
            "except ZeroDivisionError:",
            "    print('Error')",
            "print('done')",
        ],
        &["if x:", "    pass", "print('ok')"],
        &[
            "def process(items):",
            "    for item in items:",
            "        if item > 0:",
            "            print(item)",
            "        else:",
            "            print('skip')",
            "    return items",
        ],
    ];

    #[test]
    fn every_block_is_closed() {
        for program in PROGRAMS {
            let result = to_javascript(program);
            let (open, close) = brace_counts(&result.code);
            assert_eq!(open, close, "unbalanced output:\n{}", result.code);
            assert!(close > 0, "no closer emitted:\n{}", result.code);
        }
    }

    #[test]
    fn three_levels_close_at_once() {
        let result = to_javascript(&[
            "if a:",
            "    if b:",
            "        if c:",
            "            print('c')",
            "print('done')",
        ]);
        assert_eq!(brace_counts(&result.code), (3, 3));
        let lines: Vec<&str> = result.code.lines().collect();
        assert_eq!(lines[4..7], ["    }", "  }", "}"]);
        assert!(result.confidence > 0.7);
    }

    #[test]
    fn continuation_lines_add_no_closers() {
        let result = to_javascript(&[
            "def f(a):",
            "    total = add(a,",
            "            b)",
            "    return total",
            "print(f(1))",
        ]);
        assert_eq!(brace_counts(&result.code), (1, 1), "{}", result.code);
        let lines: Vec<&str> = result.code.lines().collect();
        assert_eq!(lines[lines.len() - 2..], ["}", "console.log(f(1));"]);
    }

    #[test]
    fn balance_holds_at_any_depth() {
        for depth in 1..=8 {
            let mut lines: Vec<String> = (0..depth)
                .map(|level| format!("{}while n{level} > 0:", "    ".repeat(level)))
                .collect();
            lines.push(format!("{}step()", "    ".repeat(depth)));
            let result = convert(&lines.join("\n"), "python", "javascript");
            assert_eq!(brace_counts(&result.code), (depth, depth), "{}", result.code);
            assert_eq!(result.metadata.max_depth, depth);
        }
    }

    #[test]
    fn braces_vanish_in_python() {
        let result = to_python(&[
            "if (a) {",
            "  if (b) {",
            "    if (c) {",
            "      go();",
            "    }",
            "  }",
            "}",
        ]);
        assert_eq!(brace_counts(&result.code), (0, 0));
        assert_eq!(result.code.lines().count(), 4);
    }
}

// ============================================================================
// Coordinator properties
// ============================================================================

#[test]
fn identity_returns_input() {
    let code = "let x = 1;\nconsole.log(x);";
    let result = convert(code, "javascript", "javascript");
    assert_eq!(result.code, code);
    assert_eq!(result.confidence, 1.0);
}

#[test]
fn empty_input_is_rejected() {
    let coordinator = ConversionCoordinator::default();
    assert_eq!(
        coordinator.convert("", "python", "javascript", false),
        Err(ConvertError::EmptyInput)
    );
}

#[test]
fn unregistered_pair_lists_supported_pairs() {
    let err = ConversionCoordinator::default()
        .convert("x = 1", "javascript", "java", false)
        .unwrap_err();
    let ConvertError::UnsupportedPair { supported, .. } = err else {
        panic!("expected an unsupported pair");
    };
    assert_eq!(supported, "python→javascript, javascript→python");
}

#[test]
fn confidence_and_error_count_are_consistent() {
    let programs = [
        ("python", "javascript", "with f:\n    yield x\nglobal g"),
        ("javascript", "python", "do {\n  x--;\n} while (x > 0);"),
        ("python", "javascript", "print('ok')"),
        ("javascript", "python", "const f = (a, b) => a + b;"),
    ];
    for (from, to, code) in programs {
        let result = convert(code, from, to);
        assert!((0.0..=1.0).contains(&result.confidence));
        let errors = result
            .unsupported
            .iter()
            .filter(|u| u.severity == Severity::Error)
            .count();
        assert_eq!(result.error_count, errors, "{code}");
    }
}

#[test]
fn large_input_converts_every_line() {
    let code = "ok = name.isdigit() or d.keys()\n".repeat(5_000);
    let result = convert(&code, "python", "javascript");
    let lines: Vec<&str> = result.code.lines().collect();
    assert_eq!(lines.len(), 5_000);
    assert_eq!(lines[0], "let ok = /^\\d+$/.test(name) || Object.keys(d);");
    assert!(
        lines[1..]
            .iter()
            .all(|l| *l == "ok = /^\\d+$/.test(name) || Object.keys(d);")
    );
    assert_eq!(result.metadata.lines_processed, 5_000);
}

#[test]
fn detect_then_convert() {
    let coordinator = ConversionCoordinator::default();
    let out = coordinator
        .detect_and_convert("const items = [1, 2];\nconsole.log(items);", "python", false)
        .unwrap();
    assert_eq!(out.detection.language, "javascript");
    assert_eq!(out.conversion.code, "items = [1, 2]\nprint(items)");
}
