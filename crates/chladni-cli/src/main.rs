use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use chladni_field::{
    BoundaryKind, BoundingBox, ChladniField, Point3, WaveParameters, chladni_value,
};
use chladni_mesh::export::{to_ascii_stl, to_binary_stl, to_obj};
use chladni_mesh::{Mesh, extract_from_field};

type DynError = Box<dyn Error>;
type Flags = HashMap<String, String>;

fn main() -> Result<(), DynError> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        print_usage();
        return Ok(());
    }

    match args[0].as_str() {
        "field-value" => run_field_value(&args[1..]),
        "mesh-metrics" => run_mesh_metrics(&args[1..]),
        "export-mesh" => run_export_mesh(&args[1..]),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn run_field_value(args: &[String]) -> Result<(), DynError> {
    let flags = parse_flags(args)?;
    let points_file = required_str(&flags, "--points-file")?;
    let points = read_points(points_file)?;
    let (params, boundary) = wave_config(&flags)?;

    for point in points {
        println!("{:.17}", chladni_value(point, &params, boundary));
    }
    Ok(())
}

fn run_mesh_metrics(args: &[String]) -> Result<(), DynError> {
    let flags = parse_flags(args)?;
    let mesh = build_pattern_mesh(&flags)?;

    println!("vertices {}", mesh.vertices.len());
    println!("triangles {}", mesh.triangles.len());
    println!("area {:.17}", mesh_area(&mesh));
    Ok(())
}

fn run_export_mesh(args: &[String]) -> Result<(), DynError> {
    let flags = parse_flags(args)?;
    let mesh = build_pattern_mesh(&flags)?;
    let output = required_str(&flags, "--output")?;
    let format = optional_str(&flags, "--format", "binary-stl");
    let name = optional_str(&flags, "--name", "chladni");

    match format {
        "binary-stl" => fs::write(output, to_binary_stl(&mesh, name))?,
        "ascii-stl" => fs::write(output, to_ascii_stl(&mesh, name))?,
        "obj" => fs::write(output, to_obj(&mesh))?,
        _ => return Err(format!("unknown format: {format}").into()),
    }

    Ok(())
}

fn wave_config(flags: &Flags) -> Result<(WaveParameters, BoundaryKind), DynError> {
    let params = WaveParameters {
        u: optional_f64(flags, "--u", 1.0)?,
        v: optional_f64(flags, "--v", 1.0)?,
        w: optional_f64(flags, "--w", 1.0)?,
        a: optional_f64(flags, "--a", 1.0)?,
        b: optional_f64(flags, "--b", 1.0)?,
        c: optional_f64(flags, "--c", 1.0)?,
        d: optional_f64(flags, "--d", 1.0)?,
        e: optional_f64(flags, "--e", 1.0)?,
        f: optional_f64(flags, "--f", 1.0)?,
    };
    let boundary = BoundaryKind::from_str(optional_str(flags, "--boundary", "dirichlet"))?;
    Ok((params, boundary))
}

fn build_pattern_mesh(flags: &Flags) -> Result<Mesh, DynError> {
    let (params, boundary) = wave_config(flags)?;
    let resolution = optional_usize(flags, "--resolution", 64)?;
    let bounds = BoundingBox::new(
        [
            optional_f64(flags, "--min-x", -1.0)?,
            optional_f64(flags, "--min-y", -1.0)?,
            optional_f64(flags, "--min-z", -1.0)?,
        ],
        [
            optional_f64(flags, "--max-x", 1.0)?,
            optional_f64(flags, "--max-y", 1.0)?,
            optional_f64(flags, "--max-z", 1.0)?,
        ],
    )?;

    let field = ChladniField::new(params, boundary);
    let mesh = extract_from_field(bounds, resolution, &field, 0.0)?;
    Ok(mesh)
}

fn mesh_area(mesh: &Mesh) -> f64 {
    mesh.triangles
        .iter()
        .map(|tri| {
            triangle_area(
                mesh.vertices[tri[0] as usize],
                mesh.vertices[tri[1] as usize],
                mesh.vertices[tri[2] as usize],
            )
        })
        .sum()
}

fn triangle_area(a: Point3, b: Point3, c: Point3) -> f64 {
    let ab = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let ac = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    let n = [
        ab[1] * ac[2] - ab[2] * ac[1],
        ab[2] * ac[0] - ab[0] * ac[2],
        ab[0] * ac[1] - ab[1] * ac[0],
    ];
    (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt() * 0.5
}

fn parse_flags(args: &[String]) -> Result<Flags, DynError> {
    if args.len() % 2 != 0 {
        return Err("expected flag-value pairs".into());
    }

    let mut flags = HashMap::new();
    let mut index = 0;
    while index < args.len() {
        let flag = args[index].as_str();
        if !flag.starts_with("--") {
            return Err(format!("expected flag at position {}", index + 1).into());
        }
        let value = args[index + 1].clone();
        if flags.insert(flag.to_string(), value).is_some() {
            return Err(format!("duplicate flag: {flag}").into());
        }
        index += 2;
    }
    Ok(flags)
}

fn required_str<'a>(flags: &'a Flags, key: &str) -> Result<&'a str, DynError> {
    flags
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| format!("missing required {key}").into())
}

fn optional_str<'a>(flags: &'a Flags, key: &str, default: &'a str) -> &'a str {
    flags.get(key).map(String::as_str).unwrap_or(default)
}

fn optional_f64(flags: &Flags, key: &str, default: f64) -> Result<f64, DynError> {
    match flags.get(key) {
        Some(value) => value
            .parse::<f64>()
            .map_err(|err| format!("invalid float for {key}: {err}").into()),
        None => Ok(default),
    }
}

fn optional_usize(flags: &Flags, key: &str, default: usize) -> Result<usize, DynError> {
    match flags.get(key) {
        Some(value) => value
            .parse::<usize>()
            .map_err(|err| format!("invalid usize for {key}: {err}").into()),
        None => Ok(default),
    }
}

fn read_points(path: impl AsRef<Path>) -> Result<Vec<Point3>, DynError> {
    let raw = fs::read_to_string(path)?;
    let mut points = Vec::new();

    for (line_no, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let parts = line.split_whitespace().collect::<Vec<_>>();
        if parts.len() != 3 {
            return Err(format!("line {}: expected exactly 3 floats", line_no + 1).into());
        }
        let x = parts[0].parse::<f64>()?;
        let y = parts[1].parse::<f64>()?;
        let z = parts[2].parse::<f64>()?;
        points.push([x, y, z]);
    }

    Ok(points)
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  chladni-cli field-value --points-file <path> [--u <f64>] [--v <f64>] [--w <f64>] \
         [--a..--f <f64>] [--boundary <dirichlet|neumann>]"
    );
    eprintln!(
        "  chladni-cli mesh-metrics [--resolution <usize>] [--min-x..--max-z <f64>] \
         [wave flags]"
    );
    eprintln!(
        "  chladni-cli export-mesh --output <path> [--format <binary-stl|ascii-stl|obj>] \
         [--name <str>] [--resolution <usize>] [wave flags]"
    );
}

#[cfg(test)]
mod tests {
    use super::{build_pattern_mesh, parse_flags, read_points, wave_config};

    #[test]
    fn parses_flag_pairs() {
        let args = vec![
            "--u".to_string(),
            "2.0".to_string(),
            "--boundary".to_string(),
            "neumann".to_string(),
        ];
        let flags = parse_flags(&args).expect("should parse flag pairs");
        assert_eq!(flags.get("--u").map(String::as_str), Some("2.0"));
        assert_eq!(flags.get("--boundary").map(String::as_str), Some("neumann"));
    }

    #[test]
    fn rejects_dangling_flag() {
        let args = vec!["--u".to_string()];
        assert!(parse_flags(&args).is_err());
    }

    #[test]
    fn wave_config_defaults_to_fundamental_dirichlet() {
        let flags = parse_flags(&[]).expect("empty flags should parse");
        let (params, boundary) = wave_config(&flags).expect("config should build");
        assert_eq!(params.u, 1.0);
        assert_eq!(params.f, 1.0);
        assert_eq!(boundary, chladni_field::BoundaryKind::Dirichlet);
    }

    #[test]
    fn wave_config_rejects_unknown_boundary() {
        let args = vec!["--boundary".to_string(), "mixed".to_string()];
        let flags = parse_flags(&args).expect("flags should parse");
        assert!(wave_config(&flags).is_err());
    }

    #[test]
    fn builds_pattern_mesh_from_flags() {
        let args = vec!["--resolution".to_string(), "12".to_string()];
        let flags = parse_flags(&args).expect("flags should parse");
        let mesh = build_pattern_mesh(&flags).expect("mesh build should succeed");
        assert!(!mesh.triangles.is_empty());
    }

    #[test]
    fn parses_whitespace_points() {
        let temp_dir = std::env::temp_dir();
        let path = temp_dir.join("chladni_cli_points_test.txt");
        std::fs::write(&path, "0 0 0\n0.5 -0.5 0.25\n").expect("should write test points file");

        let points = read_points(&path).expect("should parse points");
        assert_eq!(points, vec![[0.0, 0.0, 0.0], [0.5, -0.5, 0.25]]);

        let _ = std::fs::remove_file(&path);
    }
}
