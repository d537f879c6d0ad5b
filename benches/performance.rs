use std::time::{Duration, Instant};
use texfield::{
    editor::{Editor, EditorOptions, Key, layout},
    render, theme,
};

/// Performance benchmarks for field editing
///
/// Run with: cargo test --release --bench performance -- --nocapture
///
/// This measures:
/// - Typing into a text region
/// - Fusing a region's segments on blur
/// - LaTeX import and export
/// - Layout and rendering
const SMALL_REGIONS: usize = 10;
const MEDIUM_REGIONS: usize = 100;
const LARGE_REGIONS: usize = 1000;

const ITERATIONS: usize = 100;

const SAMPLE_WORDS: [&str; 12] = [
    "Lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor",
];

/// LaTeX for a math field alternating symbols and styled text regions.
fn create_field_latex(num_regions: usize) -> String {
    let styles = ["\\text", "\\textbf", "\\textit", "\\texttt"];
    let mut latex = String::new();
    for i in 0..num_regions {
        latex.push_str("x+");
        latex.push_str(styles[i % styles.len()]);
        latex.push('{');
        for j in 0..5 {
            if j > 0 {
                latex.push(' ');
            }
            latex.push_str(SAMPLE_WORDS[(i + j) % SAMPLE_WORDS.len()]);
        }
        if i % 3 == 0 {
            latex.push_str(" $y^2$ end");
        }
        latex.push('}');
    }
    latex
}

fn loaded_field(num_regions: usize) -> Editor {
    let mut editor = Editor::math_field(EditorOptions::default());
    editor
        .set_latex(&create_field_latex(num_regions))
        .expect("generated latex should parse");
    editor
}

struct BenchmarkResult {
    name: String,
    iterations: usize,
    total_duration: Duration,
    avg_duration: Duration,
    min_duration: Duration,
    max_duration: Duration,
}

impl BenchmarkResult {
    fn print(&self) {
        println!("\n{}", "=".repeat(70));
        println!("Benchmark: {}", self.name);
        println!("{}", "=".repeat(70));
        println!("Iterations:     {}", self.iterations);
        println!("Total time:     {:?}", self.total_duration);
        println!("Average:        {:?}", self.avg_duration);
        println!("Min:            {:?}", self.min_duration);
        println!("Max:            {:?}", self.max_duration);

        if self.avg_duration.as_millis() > 16 {
            println!("\nWARNING: Average duration > 16ms (may drop frames)");
        }
    }
}

fn benchmark<F>(name: &str, iterations: usize, mut f: F) -> BenchmarkResult
where
    F: FnMut(),
{
    let mut durations = Vec::with_capacity(iterations);

    // Warmup
    for _ in 0..3 {
        f();
    }

    for _ in 0..iterations {
        let start = Instant::now();
        f();
        durations.push(start.elapsed());
    }

    let total_duration: Duration = durations.iter().sum();
    let avg_duration = total_duration / iterations as u32;
    let min_duration = *durations.iter().min().unwrap();
    let max_duration = *durations.iter().max().unwrap();

    BenchmarkResult {
        name: name.to_string(),
        iterations,
        total_duration,
        avg_duration,
        min_duration,
        max_duration,
    }
}

#[test]
fn bench_typing_into_region() {
    for chars in [10, 100, 1000] {
        let result = benchmark(&format!("type {chars} chars into a region"), 20, || {
            let mut editor = Editor::math_field(EditorOptions::default());
            editor.typed_text("$");
            for i in 0..chars {
                let word = SAMPLE_WORDS[i % SAMPLE_WORDS.len()];
                let mut buf = [0; 4];
                let ch = word.chars().next().unwrap_or('a');
                editor.typed_text(ch.encode_utf8(&mut buf));
            }
        });
        result.print();
    }
}

#[test]
fn bench_fuse_on_blur() {
    let result = benchmark("split then fuse a 500 char region", ITERATIONS, || {
        let mut editor = Editor::math_field(EditorOptions::default());
        editor.typed_text("$");
        editor.typed_text(&"ab".repeat(250));
        for _ in 0..50 {
            editor.keystroke(Key::Left);
        }
        editor.keystroke(Key::Home);
        editor.keystroke(Key::Left);
    });
    result.print();
}

#[test]
fn bench_latex_round_trip() {
    for (name, regions) in [
        ("Small", SMALL_REGIONS),
        ("Medium", MEDIUM_REGIONS),
        ("Large", LARGE_REGIONS),
    ] {
        let latex = create_field_latex(regions);
        let result = benchmark(&format!("set_latex - {name}"), 20, || {
            let mut editor = Editor::math_field(EditorOptions::default());
            editor.set_latex(&latex).expect("generated latex should parse");
        });
        result.print();

        let editor = loaded_field(regions);
        let result = benchmark(&format!("latex export - {name}"), ITERATIONS, || {
            let _ = editor.latex();
        });
        result.print();
    }
}

#[test]
fn bench_rendering() {
    let theme = theme::Theme::default();
    for (name, regions) in [("Small", SMALL_REGIONS), ("Medium", MEDIUM_REGIONS)] {
        let editor = loaded_field(regions);
        for width in [40, 80, 200] {
            let result = benchmark(
                &format!("render_field - {name} @ width {width}"),
                ITERATIONS,
                || {
                    let _ = render::render_field(&editor, width, &theme);
                },
            );
            result.print();
        }
    }
}

#[test]
fn bench_seek_across_field() {
    let mut editor = loaded_field(MEDIUM_REGIONS);
    let width = layout::measure(&editor).width();
    let mut column = 0;
    let result = benchmark("seek to scattered columns", ITERATIONS, || {
        column = (column + 97) % width.max(1);
        editor.seek(column);
    });
    result.print();
}
