pub fn linspace(start: f64, end: f64, num: usize) -> impl Iterator<Item = f64> {
    let step = if num > 1 {
        (end - start) / (num - 1) as f64
    } else {
        0.0
    };
    (0..num).map(move |i| start + i as f64 * step)
}

/// Expand `(x - r_0)(x - r_1)...` into power-basis coefficients by
/// repeated convolution with the linear factors.
pub fn poly_from_roots(roots: &[f64]) -> Vec<f64> {
    let mut coeffs = vec![1.0];
    for &root in roots {
        let mut next = vec![0.0; coeffs.len() + 1];
        for (i, &c) in coeffs.iter().enumerate() {
            next[i] += c * -root;
            next[i + 1] += c;
        }
        coeffs = next;
    }
    coeffs
}

#[allow(dead_code)]
pub fn init_test_logger() {
    use std::io::Write as _;
    let _ = env_logger::builder()
        .is_test(true)
        .format(|buf, record| {
            // Ansi256 ref: https://hexdocs.pm/color_palette/ansi_color_codes.html
            let bg = anstyle::Ansi256Color(240);
            let level_style = buf
                .default_level_style(record.level())
                .bg_color(Some(bg.into()));
            let grey = anstyle::Ansi256Color(255).on(bg);

            let filepath = match record.file() {
                Some(f) => {
                    // Get just the file name, not the full path.
                    let path = std::path::Path::new(f);
                    match path.file_name() {
                        Some(name) => name.to_string_lossy(),
                        None => "unknown".into(),
                    }
                }
                None => "unknown".into(),
            };
            writeln!(
                buf,
                "{grey}[{grey:#}{level_style}{}{level_style:#}{grey} {}:{}]{grey:#}   {}",
                record.level(),
                filepath,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poly_from_roots_expands_factors() {
        // (x - 1)(x - 2)(x - 3) = x^3 - 6x^2 + 11x - 6
        assert_eq!(poly_from_roots(&[1.0, 2.0, 3.0]), vec![-6.0, 11.0, -6.0, 1.0]);
        assert_eq!(poly_from_roots(&[]), vec![1.0]);
    }

    #[test]
    fn linspace_endpoints() {
        let points: Vec<f64> = linspace(-1.0, 1.0, 5).collect();
        assert_eq!(points, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
    }
}
