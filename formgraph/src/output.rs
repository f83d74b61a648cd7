//! Geometry output implementation
use crate::tessellate::{Geometry, Topology};
use std::io::{BufWriter, Write};

/// Converts a color channel to a byte, clamping to `[0, 1]`
fn channel(c: f32) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl Geometry {
    /// Writes an ASCII PLY file to the given output
    ///
    /// Every vertex is written with its color.  Triangle strips become
    /// faces (with alternating winding, so that every face in a strip faces
    /// the same way), line strips become edges, and point runs contribute
    /// bare vertices.
    pub fn write_ply<F: std::io::Write>(
        &self,
        out: &mut F,
    ) -> Result<(), crate::Error> {
        let mut faces = vec![];
        let mut edges = vec![];
        let mut offset = 0;
        for run in self.runs() {
            let n = run.vertices.len();
            match run.topology {
                Topology::TriangleStrip => {
                    for i in 0..n.saturating_sub(2) {
                        let j = offset + i;
                        faces.push(if i % 2 == 0 {
                            [j, j + 1, j + 2]
                        } else {
                            [j + 1, j, j + 2]
                        });
                    }
                }
                Topology::LineStrip => {
                    for i in 0..n.saturating_sub(1) {
                        edges.push([offset + i, offset + i + 1]);
                    }
                }
                Topology::Points => (),
            }
            offset += n;
        }

        // Lots of small writes, so buffer them
        let mut out = BufWriter::new(out);
        writeln!(out, "ply")?;
        writeln!(out, "format ascii 1.0")?;
        writeln!(out, "comment exported by formgraph")?;
        writeln!(out, "element vertex {offset}")?;
        for p in ["x", "y", "z"] {
            writeln!(out, "property float {p}")?;
        }
        for p in ["red", "green", "blue"] {
            writeln!(out, "property uchar {p}")?;
        }
        writeln!(out, "element face {}", faces.len())?;
        writeln!(out, "property list uchar int vertex_indices")?;
        writeln!(out, "element edge {}", edges.len())?;
        writeln!(out, "property int vertex1")?;
        writeln!(out, "property int vertex2")?;
        writeln!(out, "end_header")?;

        for v in self.vertices() {
            let p = v.position;
            let c = v.color.map(channel);
            writeln!(out, "{} {} {} {} {} {}", p.x, p.y, p.z, c.x, c.y, c.z)?;
        }
        for [a, b, c] in faces {
            writeln!(out, "3 {a} {b} {c}")?;
        }
        for [a, b] in edges {
            writeln!(out, "{a} {b}")?;
        }
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        classify::classify,
        eval::Binding,
        tessellate::{Domain, Plot},
    };

    fn ply(formula: &str, domain: &Domain) -> String {
        let mut b = Binding::new();
        let plot = Plot::compile(&classify(formula), &b).unwrap();
        let g = plot.tessellate(&mut b, domain, None);
        let mut out = vec![];
        g.write_ply(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_channel() {
        assert_eq!(channel(-0.5), 0);
        assert_eq!(channel(0.5), 128);
        assert_eq!(channel(1.2), 255);
    }

    #[test]
    fn test_plane_ply() {
        let s = ply("x = 1", &Domain::new(-5.0, 5.0, 1.0));
        assert!(s.starts_with("ply\nformat ascii 1.0\n"));
        assert!(s.contains("element vertex 4\n"));
        assert!(s.contains("element face 2\n"));
        assert!(s.contains("element edge 0\n"));
        let body = s.split("end_header\n").nth(1).unwrap();
        let lines: Vec<_> = body.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "1 -5 -5 204 153 51");
        assert_eq!(lines[4], "3 0 1 2");
        assert_eq!(lines[5], "3 2 1 3");
    }

    #[test]
    fn test_line_ply() {
        let s = ply("x = y = z", &Domain::new(-1.0, 1.0, 0.5));
        assert!(s.contains("element vertex 401\n"));
        assert!(s.contains("element face 0\n"));
        assert!(s.contains("element edge 400\n"));
        assert!(s.ends_with("399 400\n"));
    }

    #[test]
    fn test_empty_ply() {
        let s = ply("x = 1", &Domain::new(2.0, 5.0, 1.0));
        assert!(s.contains("element vertex 0\n"));
        assert!(s.ends_with("end_header\n"));
    }
}
