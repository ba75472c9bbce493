//! Small meshes shared by unit tests.

use std::collections::HashMap;

use nalgebra::Point3;

use super::{build_from_triangles, HalfEdgeMesh};

pub(crate) fn single_triangle() -> HalfEdgeMesh {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ];
    build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap()
}

/// Unit square split along the (0, 2) diagonal.
pub(crate) fn quad() -> HalfEdgeMesh {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ];
    build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap()
}

pub(crate) fn tetrahedron() -> HalfEdgeMesh {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.5, 1.0, 0.0),
        Point3::new(0.5, 0.5, 1.0),
    ];
    let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
    build_from_triangles(&vertices, &faces).unwrap()
}

/// Flat `n x n` grid in the z = 0 plane; vertex `(i, j)` has index `j * (n + 1) + i`.
pub(crate) fn grid(n: usize, spacing: f64) -> HalfEdgeMesh {
    let mut vertices = Vec::new();
    let mut faces = Vec::new();

    for j in 0..=n {
        for i in 0..=n {
            vertices.push(Point3::new(i as f64 * spacing, j as f64 * spacing, 0.0));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    build_from_triangles(&vertices, &faces).unwrap()
}

/// Closed axis-aligned cube `[0, size]^3`, each side an `n x n` grid.
pub(crate) fn cube(n: usize, size: f64) -> HalfEdgeMesh {
    // (origin, u axis, v axis) with u x v pointing outwards.
    let sides: [([usize; 3], usize, usize); 6] = [
        ([0, 0, 0], 1, 0),
        ([0, 0, n], 0, 1),
        ([0, 0, 0], 0, 2),
        ([0, n, 0], 2, 0),
        ([0, 0, 0], 2, 1),
        ([n, 0, 0], 1, 2),
    ];

    let mut lattice: HashMap<[usize; 3], usize> = HashMap::new();
    let mut vertices = Vec::new();
    let mut faces = Vec::new();

    let mut index_of = |c: [usize; 3], vertices: &mut Vec<Point3<f64>>| -> usize {
        *lattice.entry(c).or_insert_with(|| {
            let s = size / n as f64;
            vertices.push(Point3::new(c[0] as f64 * s, c[1] as f64 * s, c[2] as f64 * s));
            vertices.len() - 1
        })
    };

    for (origin, u, v) in sides {
        let at = |i: usize, j: usize| {
            let mut c = origin;
            c[u] += i;
            c[v] += j;
            c
        };
        for j in 0..n {
            for i in 0..n {
                let v00 = index_of(at(i, j), &mut vertices);
                let v10 = index_of(at(i + 1, j), &mut vertices);
                let v11 = index_of(at(i + 1, j + 1), &mut vertices);
                let v01 = index_of(at(i, j + 1), &mut vertices);
                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            }
        }
    }

    build_from_triangles(&vertices, &faces).unwrap()
}

/// Unit sphere from a subdivided icosahedron.
pub(crate) fn icosphere(subdivisions: usize) -> HalfEdgeMesh {
    let phi = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let scale = 1.0 / (1.0 + phi * phi).sqrt();

    let mut vertices: Vec<Point3<f64>> = [
        [-1.0, phi, 0.0],
        [1.0, phi, 0.0],
        [-1.0, -phi, 0.0],
        [1.0, -phi, 0.0],
        [0.0, -1.0, phi],
        [0.0, 1.0, phi],
        [0.0, -1.0, -phi],
        [0.0, 1.0, -phi],
        [phi, 0.0, -1.0],
        [phi, 0.0, 1.0],
        [-phi, 0.0, -1.0],
        [-phi, 0.0, 1.0],
    ]
    .iter()
    .map(|c| Point3::new(c[0], c[1], c[2]) * scale)
    .collect();

    let mut faces = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut new_faces = Vec::with_capacity(faces.len() * 4);
        let mut midpoints: HashMap<(usize, usize), usize> = HashMap::new();

        for face in &faces {
            let mut mids = [0usize; 3];
            for i in 0..3 {
                let (a, b) = (face[i], face[(i + 1) % 3]);
                let key = (a.min(b), a.max(b));
                mids[i] = *midpoints.entry(key).or_insert_with(|| {
                    let mid = (vertices[a].coords + vertices[b].coords).normalize();
                    vertices.push(Point3::from(mid));
                    vertices.len() - 1
                });
            }

            new_faces.push([face[0], mids[0], mids[2]]);
            new_faces.push([face[1], mids[1], mids[0]]);
            new_faces.push([face[2], mids[2], mids[1]]);
            new_faces.push([mids[0], mids[1], mids[2]]);
        }

        faces = new_faces;
    }

    build_from_triangles(&vertices, &faces).unwrap()
}
