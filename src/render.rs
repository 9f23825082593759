use crate::view::TreeView;

/// Render the current animated frame — history panel, connectors, node
/// cards — to a static SVG string. Hosts with their own canvas ignore this;
/// tests and headless tooling use it to look at what the user would see.
pub fn render_frame(view: &TreeView) -> String {
    let config = view.config();
    let theme = view.theme();
    let width = config.width.max(200.0);
    let height = config.height.max(200.0);
    let line_height = theme.font_size * theme.line_height;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    // Breadcrumb panel backdrop.
    let panel_width = config.block_width() + 20.0;
    svg.push_str(&format!(
        "<rect x=\"30\" y=\"50\" width=\"{panel_width:.2}\" height=\"{:.2}\" rx=\"5\" ry=\"5\" fill=\"{}\" stroke=\"{}\" stroke-width=\"2\"/>",
        height - 100.0,
        theme.panel_fill,
        theme.panel_border
    ));

    for item in view.breadcrumbs().items() {
        let sprite = &item.state;
        let visual = &item.data;
        let half_w = config.block_width() / 2.0;
        let top = sprite.y - visual.height / 2.0;
        svg.push_str(&format!("<g opacity=\"{:.3}\">", sprite.opacity));
        svg.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{top:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"5\" ry=\"5\" fill=\"{}\" stroke=\"{}\"/>",
            sprite.x - half_w,
            config.block_width(),
            visual.height,
            visual.color,
            theme.block_stroke
        ));
        svg.push_str(&text_lines(
            &visual.lines,
            sprite.x - half_w + config.block_margin_x,
            top + config.block_margin_y,
            line_height,
            theme,
        ));
        svg.push_str("</g>");
    }

    // Connectors under the cards.
    for item in view.links().items() {
        let p = item.state.points;
        svg.push_str(&format!(
            "<path d=\"M{:.2},{:.2}C{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\" opacity=\"{:.3}\"/>",
            p[0].0, p[0].1, p[1].0, p[1].1, p[2].0, p[2].1, p[3].0, p[3].1,
            item.data.color,
            item.state.opacity
        ));
    }

    for item in view.nodes().items() {
        let sprite = &item.state;
        let visual = &item.data;
        let half_w = config.block_width() / 2.0;
        svg.push_str(&format!(
            "<g opacity=\"{:.3}\" transform=\"translate({:.2},{:.2})\">",
            sprite.opacity, sprite.x, sprite.y
        ));
        let mut cursor = -visual.height / 2.0;
        for block in &visual.blocks {
            svg.push_str(&format!(
                "<rect x=\"{:.2}\" y=\"{cursor:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"5\" ry=\"5\" fill=\"{}\" stroke=\"{}\"/>",
                -half_w, block.width, block.height, block.fill, theme.block_stroke
            ));
            svg.push_str(&text_lines(
                &block.lines,
                -half_w + config.block_margin_x,
                cursor + config.block_margin_y,
                line_height,
                theme,
            ));
            cursor += block.height;
        }
        // Navigation button on the left, expand/drill button on the right;
        // groups carry no left button.
        if !visual.is_group {
            svg.push_str(&button_rect(
                -half_w - config.button_width,
                visual.height,
                config.button_width,
                theme,
            ));
        }
        svg.push_str(&button_rect(half_w, visual.height, config.button_width, theme));
        svg.push_str("</g>");
    }

    svg.push_str("</svg>");
    svg
}

fn button_rect(x: f32, node_height: f32, width: f32, theme: &crate::theme::Theme) -> String {
    format!(
        "<rect x=\"{x:.2}\" y=\"{:.2}\" width=\"{width:.2}\" height=\"{node_height:.2}\" rx=\"5\" ry=\"5\" fill=\"{}\"/>",
        -node_height / 2.0,
        theme.button_fill
    )
}

fn text_lines(
    lines: &[String],
    x: f32,
    top: f32,
    line_height: f32,
    theme: &crate::theme::Theme,
) -> String {
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let baseline = top + line_height * (i as f32 + 0.8);
        out.push_str(&format!(
            "<text x=\"{x:.2}\" y=\"{baseline:.2}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            theme.font_family,
            theme.font_size,
            theme.text_color,
            escape_xml(line)
        ));
    }
    out
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
