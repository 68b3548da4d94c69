use std::collections::HashMap;

use once_cell::sync::Lazy;

const FONT_HEIGHT: usize = 5;
const FONT_WIDTH: usize = 4;
const FILL_CHAR: char = '█';
const SHADE_CHAR: char = '▒';

type Glyph = [&'static str; FONT_HEIGHT];

static GLYPHS: Lazy<HashMap<char, Glyph>> = Lazy::new(|| {
    HashMap::from([
        ('0', ["####", "#  #", "#  #", "#  #", "####"]),
        ('1', ["  # ", " ## ", "  # ", "  # ", " ###"]),
        ('2', ["####", "   #", "####", "#   ", "####"]),
        ('3', ["####", "   #", " ###", "   #", "####"]),
        ('4', ["#  #", "#  #", "####", "   #", "   #"]),
        ('5', ["####", "#   ", "####", "   #", "####"]),
        ('6', ["####", "#   ", "####", "#  #", "####"]),
        ('7', ["####", "   #", "  # ", " #  ", " #  "]),
        ('8', ["####", "#  #", "####", "#  #", "####"]),
        ('9', ["####", "#  #", "####", "   #", "####"]),
        (' ', ["    ", "    ", "    ", "    ", "    "]),
    ])
});

/// Render digits as a chunky banner; unknown characters become blanks.
pub fn render(text: &str) -> Vec<String> {
    let glyphs: Vec<&Glyph> = text
        .chars()
        .filter_map(|ch| GLYPHS.get(&ch).or_else(|| GLYPHS.get(&' ')))
        .collect();

    (0..FONT_HEIGHT)
        .map(|row| {
            let line = glyphs
                .iter()
                .map(|glyph| paint_row(glyph[row]))
                .collect::<Vec<_>>()
                .join("  ");
            line.trim_end().to_string()
        })
        .collect()
}

/// Height in rows of a rendered banner.
pub fn height() -> usize {
    FONT_HEIGHT
}

fn paint_row(row: &str) -> String {
    let mut painted = String::with_capacity(FONT_WIDTH * 2 * 3);
    let mut previous_filled = false;
    for symbol in row.chars() {
        let filled = symbol == '#';
        match (filled, previous_filled) {
            (true, _) => painted.push_str(&FILL_CHAR.to_string().repeat(2)),
            (false, true) => painted.push_str(&format!("{SHADE_CHAR} ")),
            (false, false) => painted.push_str("  "),
        }
        previous_filled = filled;
    }
    painted
}
