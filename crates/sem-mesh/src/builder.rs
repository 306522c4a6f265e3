//! Structured mesh builders.
//!
//! Uniform quad/tri grids on a rectangle and hex/tet grids on a box, with
//! boundary side sets named `left/right/bottom/top` (2D) plus `front/back`
//! (3D). These are the meshes the end-to-end eigenmode tests run on and a
//! convenient starting point when no external mesh file is given.

use crate::error::Result;
use crate::mesh::{Cell, ElementShape, Mesh};

/// Uniform quadrilateral grid on `[x0, x1] x [y0, y1]`.
///
/// Cells are ordered row-major (x fastest). Side sets: `bottom`, `top`,
/// `left`, `right`.
pub fn structured_quads(nx: usize, ny: usize, x: [f64; 2], y: [f64; 2]) -> Result<Mesh> {
    let mut mesh = Mesh::new(2)?;
    push_grid_vertices_2d(&mut mesh, nx, ny, x, y);

    let v = |i: usize, j: usize| i + (nx + 1) * j;
    for j in 0..ny {
        for i in 0..nx {
            mesh.cells.push(Cell::new(
                ElementShape::Quad,
                vec![v(i, j), v(i + 1, j), v(i + 1, j + 1), v(i, j + 1)],
            ));
            let cell = mesh.cells.len() - 1;
            // Quad local faces: 0 bottom, 1 top, 2 left, 3 right.
            if j == 0 {
                mesh.side_sets.add_side("bottom", cell, 0);
            }
            if j == ny - 1 {
                mesh.side_sets.add_side("top", cell, 1);
            }
            if i == 0 {
                mesh.side_sets.add_side("left", cell, 2);
            }
            if i == nx - 1 {
                mesh.side_sets.add_side("right", cell, 3);
            }
        }
    }
    mesh.validate()?;
    Ok(mesh)
}

/// Uniform triangle grid: each cell of the quad grid split along its
/// up-diagonal. Side sets as in [`structured_quads`].
pub fn structured_tris(nx: usize, ny: usize, x: [f64; 2], y: [f64; 2]) -> Result<Mesh> {
    let mut mesh = Mesh::new(2)?;
    push_grid_vertices_2d(&mut mesh, nx, ny, x, y);

    let v = |i: usize, j: usize| i + (nx + 1) * j;
    for j in 0..ny {
        for i in 0..nx {
            // Lower-right triangle, counter-clockwise.
            mesh.cells.push(Cell::new(
                ElementShape::Tri,
                vec![v(i, j), v(i + 1, j), v(i + 1, j + 1)],
            ));
            let lower = mesh.cells.len() - 1;
            // Tri local faces: 0 = (v0,v1), 1 = (v1,v2), 2 = (v2,v0).
            if j == 0 {
                mesh.side_sets.add_side("bottom", lower, 0);
            }
            if i == nx - 1 {
                mesh.side_sets.add_side("right", lower, 1);
            }

            // Upper-left triangle.
            mesh.cells.push(Cell::new(
                ElementShape::Tri,
                vec![v(i, j), v(i + 1, j + 1), v(i, j + 1)],
            ));
            let upper = mesh.cells.len() - 1;
            if j == ny - 1 {
                mesh.side_sets.add_side("top", upper, 1);
            }
            if i == 0 {
                mesh.side_sets.add_side("left", upper, 2);
            }
        }
    }
    mesh.validate()?;
    Ok(mesh)
}

/// Uniform hexahedral grid on a box.
///
/// Side sets: `bottom`/`top` (z), `front`/`back` (y), `left`/`right` (x),
/// matching the hex local face order of [`ElementShape::faces`].
pub fn structured_hexes(
    nx: usize,
    ny: usize,
    nz: usize,
    x: [f64; 2],
    y: [f64; 2],
    z: [f64; 2],
) -> Result<Mesh> {
    let mut mesh = Mesh::new(3)?;
    push_grid_vertices_3d(&mut mesh, nx, ny, nz, x, y, z);

    let v = |i: usize, j: usize, k: usize| i + (nx + 1) * (j + (ny + 1) * k);
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                mesh.cells.push(Cell::new(
                    ElementShape::Hex,
                    vec![
                        v(i, j, k),
                        v(i + 1, j, k),
                        v(i + 1, j + 1, k),
                        v(i, j + 1, k),
                        v(i, j, k + 1),
                        v(i + 1, j, k + 1),
                        v(i + 1, j + 1, k + 1),
                        v(i, j + 1, k + 1),
                    ],
                ));
                let cell = mesh.cells.len() - 1;
                if k == 0 {
                    mesh.side_sets.add_side("bottom", cell, 0);
                }
                if k == nz - 1 {
                    mesh.side_sets.add_side("top", cell, 1);
                }
                if j == 0 {
                    mesh.side_sets.add_side("front", cell, 2);
                }
                if j == ny - 1 {
                    mesh.side_sets.add_side("back", cell, 3);
                }
                if i == 0 {
                    mesh.side_sets.add_side("left", cell, 4);
                }
                if i == nx - 1 {
                    mesh.side_sets.add_side("right", cell, 5);
                }
            }
        }
    }
    mesh.validate()?;
    Ok(mesh)
}

/// Uniform tetrahedral grid: each hex of the box grid split into six
/// right-handed tets (Kuhn subdivision), face-compatible across cells.
/// Boundary side sets are recovered by plane membership tests.
pub fn structured_tets(
    nx: usize,
    ny: usize,
    nz: usize,
    x: [f64; 2],
    y: [f64; 2],
    z: [f64; 2],
) -> Result<Mesh> {
    let mut mesh = Mesh::new(3)?;
    push_grid_vertices_3d(&mut mesh, nx, ny, nz, x, y, z);

    let v = |i: usize, j: usize, k: usize| i + (nx + 1) * (j + (ny + 1) * k);

    // The six axis permutations walking from corner (0,0,0) to (1,1,1).
    const PATHS: [[usize; 3]; 6] = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];

    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                for path in PATHS {
                    let mut corner = [i, j, k];
                    let mut verts = vec![v(corner[0], corner[1], corner[2])];
                    for &axis in &path {
                        corner[axis] += 1;
                        verts.push(v(corner[0], corner[1], corner[2]));
                    }
                    if permutation_is_odd(path) {
                        verts.swap(2, 3);
                    }
                    mesh.cells.push(Cell::new(ElementShape::Tet, verts));
                }
            }
        }
    }

    collect_boundary_sides(&mut mesh, x, y, z);
    mesh.validate()?;
    Ok(mesh)
}

fn push_grid_vertices_2d(mesh: &mut Mesh, nx: usize, ny: usize, x: [f64; 2], y: [f64; 2]) {
    let dx = (x[1] - x[0]) / nx as f64;
    let dy = (y[1] - y[0]) / ny as f64;
    for j in 0..=ny {
        for i in 0..=nx {
            mesh.coords
                .push([x[0] + i as f64 * dx, y[0] + j as f64 * dy, 0.0]);
        }
    }
}

fn push_grid_vertices_3d(
    mesh: &mut Mesh,
    nx: usize,
    ny: usize,
    nz: usize,
    x: [f64; 2],
    y: [f64; 2],
    z: [f64; 2],
) {
    let dx = (x[1] - x[0]) / nx as f64;
    let dy = (y[1] - y[0]) / ny as f64;
    let dz = (z[1] - z[0]) / nz as f64;
    for k in 0..=nz {
        for j in 0..=ny {
            for i in 0..=nx {
                mesh.coords.push([
                    x[0] + i as f64 * dx,
                    y[0] + j as f64 * dy,
                    z[0] + k as f64 * dz,
                ]);
            }
        }
    }
}

fn permutation_is_odd(p: [usize; 3]) -> bool {
    let mut inversions = 0;
    for a in 0..3 {
        for b in (a + 1)..3 {
            if p[a] > p[b] {
                inversions += 1;
            }
        }
    }
    inversions % 2 == 1
}

/// Assign every cell face whose vertices all lie on one of the six box
/// planes to the corresponding named side set.
fn collect_boundary_sides(mesh: &mut Mesh, x: [f64; 2], y: [f64; 2], z: [f64; 2]) {
    let extent = (x[1] - x[0]).abs().max((y[1] - y[0]).abs()).max((z[1] - z[0]).abs());
    let tol = 1e-10 * extent.max(1.0);
    let planes: [(&str, usize, f64); 6] = [
        ("left", 0, x[0]),
        ("right", 0, x[1]),
        ("front", 1, y[0]),
        ("back", 1, y[1]),
        ("bottom", 2, z[0]),
        ("top", 2, z[1]),
    ];

    let mut sides: Vec<(&str, usize, usize)> = Vec::new();
    for (cell_id, cell) in mesh.cells.iter().enumerate() {
        for (face_id, face) in cell.shape.faces().iter().enumerate() {
            for &(name, axis, value) in &planes {
                let on_plane = face
                    .iter()
                    .all(|&lv| (mesh.coords[cell.vertices[lv]][axis] - value).abs() < tol);
                if on_plane {
                    sides.push((name, cell_id, face_id));
                }
            }
        }
    }
    for (name, cell, face) in sides {
        mesh.side_sets.add_side(name, cell, face);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tet_volume(coords: &[[f64; 3]]) -> f64 {
        let d = |a: usize, b: usize| {
            [
                coords[a][0] - coords[b][0],
                coords[a][1] - coords[b][1],
                coords[a][2] - coords[b][2],
            ]
        };
        let u = d(1, 0);
        let v = d(2, 0);
        let w = d(3, 0);
        (u[0] * (v[1] * w[2] - v[2] * w[1]) - u[1] * (v[0] * w[2] - v[2] * w[0])
            + u[2] * (v[0] * w[1] - v[1] * w[0]))
            / 6.0
    }

    #[test]
    fn quad_grid_counts_and_sets() {
        let mesh = structured_quads(2, 2, [-1.0, 1.0], [-1.0, 1.0]).unwrap();
        assert_eq!(mesh.num_vertices(), 9);
        assert_eq!(mesh.num_cells(), 4);
        for name in ["left", "right", "bottom", "top"] {
            assert_eq!(mesh.side_sets.get(name).unwrap().sides.len(), 2, "{name}");
        }
    }

    #[test]
    fn tri_grid_covers_the_square() {
        let mesh = structured_tris(2, 2, [-1.0, 1.0], [-1.0, 1.0]).unwrap();
        assert_eq!(mesh.num_cells(), 8);
        // Every boundary edge appears in exactly one set entry: 2 per side.
        for name in ["left", "right", "bottom", "top"] {
            assert_eq!(mesh.side_sets.get(name).unwrap().sides.len(), 2, "{name}");
        }
    }

    #[test]
    fn hex_grid_counts_and_sets() {
        let mesh = structured_hexes(2, 2, 2, [-1.0, 1.0], [-1.0, 1.0], [-1.0, 1.0]).unwrap();
        assert_eq!(mesh.num_vertices(), 27);
        assert_eq!(mesh.num_cells(), 8);
        for name in ["left", "right", "front", "back", "bottom", "top"] {
            assert_eq!(mesh.side_sets.get(name).unwrap().sides.len(), 4, "{name}");
        }
    }

    #[test]
    fn tet_grid_is_right_handed_and_fills_the_box() {
        let mesh = structured_tets(1, 1, 1, [0.0, 1.0], [0.0, 1.0], [0.0, 1.0]).unwrap();
        assert_eq!(mesh.num_cells(), 6);
        let mut total = 0.0;
        for c in 0..mesh.num_cells() {
            let vol = tet_volume(&mesh.cell_coords(c));
            assert!(vol > 0.0, "tet {c} has non-positive volume {vol}");
            total += vol;
        }
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn tet_grid_boundary_sides_cover_each_face() {
        let mesh = structured_tets(2, 2, 2, [0.0, 1.0], [0.0, 1.0], [0.0, 1.0]).unwrap();
        // Each box face is covered by 2 triangles per hex face, 4 hex faces
        // per side of the 2x2x2 grid.
        for name in ["left", "right", "front", "back", "bottom", "top"] {
            assert_eq!(mesh.side_sets.get(name).unwrap().sides.len(), 8, "{name}");
        }
    }
}
