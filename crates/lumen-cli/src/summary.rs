use std::path::Path;

use console::Style;
use lumen_core::pipeline::{FusionConfig, FusionResult};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

fn on_off(s: &Styles, enabled: bool) -> String {
    if enabled {
        s.method.apply_to("enabled").to_string()
    } else {
        s.disabled.apply_to("disabled").to_string()
    }
}

pub fn print_fusion_summary(config: &FusionConfig, frame_count: usize, output: &Path) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Lumen Fusion"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(12)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(frame_count)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(output.display())
    );
    let workers = config
        .worker_threads
        .map(|n| n.to_string())
        .unwrap_or_else(|| "all cores".to_string());
    println!(
        "  {:<14}{}",
        s.label.apply_to("Workers"),
        s.value.apply_to(workers)
    );
    println!();

    println!("  {}", s.header.apply_to("Burst"));
    let window = if config.max_frames == 0 {
        "all frames".to_string()
    } else {
        format!("{} frames", config.max_frames)
    };
    println!(
        "    {:<12}{}",
        s.label.apply_to("Window"),
        s.value.apply_to(window)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Minimum"),
        s.value.apply_to(config.min_frames)
    );
    println!();

    println!("  {}", s.header.apply_to("Alignment"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Method"),
        s.method.apply_to(config.effective_alignment())
    );
    if config.prefer_speed {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Mode"),
            s.value.apply_to("fast")
        );
    }
    println!();

    println!("  {}", s.header.apply_to("Merge"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Ghosts"),
        on_off(&s, config.enable_ghost_elimination)
    );
    if config.enable_ghost_elimination {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Threshold"),
            s.value.apply_to(config.ghost.threshold)
        );
    }
    println!();

    println!("  {}", s.header.apply_to("Post-processing"));
    if config.denoise_strength > 0.0 {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Denoise"),
            s.value.apply_to(format!(
                "{:.2} (radius {})",
                config.denoise_strength, config.denoise.radius
            ))
        );
    } else {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Denoise"),
            s.disabled.apply_to("disabled")
        );
    }
    println!(
        "    {:<12}{}",
        s.label.apply_to("HDR"),
        on_off(&s, config.enable_hdr)
    );
    println!();
}

pub fn print_result_summary(result: &FusionResult) {
    let s = Styles::new();

    println!();
    println!("  {}", s.header.apply_to("Result"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Size"),
        s.value
            .apply_to(format!("{}x{}", result.image.width(), result.image.height()))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(format!(
            "{} (reference #{})",
            result.frames_used, result.reference_index
        ))
    );
    for (i, t) in result.transforms.iter().enumerate() {
        if i == result.reference_index {
            continue;
        }
        let mean_weight = result
            .ghost_masks
            .mask(i)
            .and_then(|mask| mask.mean())
            .unwrap_or(1.0);
        println!(
            "    {:<12}{}",
            s.label.apply_to(format!("Frame {i}")),
            s.value.apply_to(format!(
                "shift ({:+.0}, {:+.0})  weight {:.2}",
                t.offset_x, t.offset_y, mean_weight
            ))
        );
    }
    let t = &result.timings;
    println!(
        "    {:<12}{}",
        s.label.apply_to("Time"),
        s.value.apply_to(format!(
            "{:.2?} (align {:.2?}, merge {:.2?}, post {:.2?})",
            t.total(),
            t.align,
            t.merge,
            t.post_process
        ))
    );
}
