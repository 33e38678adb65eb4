use approx::assert_relative_eq;
use contact_mesh::primitives::{create_box, create_plate, create_sphere};
use contact_mesh::{
    ContactMeshError, ContactSurface, ContactSurfaceProperties, InMemoryMeshLoader,
    MaterialProperty, OverflowPolicy, RayTraversal, Region,
};
use glam::DVec3;

fn loader_with(entries: &[(&str, contact_mesh::Mesh)]) -> InMemoryMeshLoader {
    let mut loader = InMemoryMeshLoader::default();
    for (path, mesh) in entries {
        loader.insert(*path, mesh.clone());
    }
    loader
}

/// Barycentric coordinates of `p` with respect to the triangle.
fn barycentric(p: DVec3, [a, b, c]: [DVec3; 3]) -> (f64, f64, f64) {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;
    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);
    let denom = d00 * d11 - d01 * d01;
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    (1.0 - v - w, v, w)
}

#[test]
fn unit_cube_ray_hits_top_face() {
    let loader = loader_with(&[("cube.stl", create_box(DVec3::ONE, true).unwrap())]);
    let mut surface = ContactSurface::new("cube", ContactSurfaceProperties::new("cube.stl"), loader);
    surface.ensure_built().unwrap();

    let root = surface.tree().unwrap().node(surface.tree().unwrap().root()).bounds;
    let size = root.size();
    let mut sorted = [size.x, size.y, size.z];
    sorted.sort_by(f64::total_cmp);
    for extent in sorted {
        assert_relative_eq!(extent, 1.0, epsilon = 1e-4);
    }

    let hit = surface
        .ray_intersect(DVec3::new(0.0, 0.0, 5.0), DVec3::NEG_Z, 0.0, 10.0)
        .unwrap();
    assert_relative_eq!(hit.distance, 4.5, epsilon = 1e-9);
    assert!(hit.triangle == 2 || hit.triangle == 3);
    assert_relative_eq!(hit.point.z, 0.5, epsilon = 1e-12);
}

#[test]
fn ray_outside_world_misses() {
    let loader = loader_with(&[("cube.obj", create_box(DVec3::ONE, true).unwrap())]);
    let mut surface = ContactSurface::new("cube", ContactSurfaceProperties::new("cube.obj"), loader);
    surface.rebuild().unwrap();
    assert!(surface
        .ray_intersect(DVec3::new(10.0, 10.0, 10.0), DVec3::X, -100.0, 100.0)
        .is_none());
}

#[test]
fn sphere_hits_lie_inside_their_triangles() {
    let loader = loader_with(&[("ball.vtp", create_sphere(1.0, 24).unwrap())]);
    let mut surface = ContactSurface::new("ball", ContactSurfaceProperties::new("ball.vtp"), loader);
    surface.rebuild().unwrap();

    for traversal in [RayTraversal::Heuristic, RayTraversal::Exact] {
        surface.properties_mut().ray_traversal = traversal;
        surface.ensure_built().unwrap();
        for k in 0..24 {
            let theta = f64::from(k) * 0.37;
            let phi = 0.3 + f64::from(k % 6) * 0.4;
            let dir = DVec3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos());
            let origin = dir * 3.0;

            let hit = surface.ray_intersect(origin, -dir, 0.0, 10.0).unwrap();
            let corners = surface.face_vertex_locations(hit.triangle).unwrap();
            let normal = surface.triangle_normal(hit.triangle).unwrap();
            assert_relative_eq!((hit.point - corners[0]).dot(normal), 0.0, epsilon = 1e-9);

            let (u, v, w) = barycentric(hit.point, corners);
            for coord in [u, v, w] {
                assert!((-1e-9..=1.0 + 1e-9).contains(&coord), "{u} {v} {w}");
            }
            assert_relative_eq!(u + v + w, 1.0, epsilon = 1e-12);
            // Facets sit inside the unit sphere, within a few percent of it.
            assert!(hit.distance > 2.0 - 1e-9 && hit.distance < 2.05);
        }
    }
}

#[test]
fn rebuild_twice_is_identical() {
    let loader = loader_with(&[("ball.obj", create_sphere(2.0, 12).unwrap())]);
    let mut surface = ContactSurface::new("ball", ContactSurfaceProperties::new("ball.obj"), loader);
    surface.rebuild().unwrap();
    let tree = surface.tree().unwrap().clone();
    let centers = surface.triangle_centers().unwrap().to_vec();
    let areas = surface.triangle_areas().unwrap().to_vec();
    let upper = surface.regional_triangles(Region::PositiveZ).unwrap().to_vec();

    surface.rebuild().unwrap();
    assert_eq!(surface.tree().unwrap(), &tree);
    assert_eq!(surface.tree().unwrap().covered_triangles(), tree.covered_triangles());
    assert_eq!(surface.triangle_centers().unwrap(), &centers[..]);
    assert_eq!(surface.triangle_areas().unwrap(), &areas[..]);
    assert_eq!(surface.regional_triangles(Region::PositiveZ).unwrap(), &upper[..]);
}

#[test]
fn wide_gap_thickness_follows_overflow_policy() {
    let loader = loader_with(&[
        ("front.stl", create_plate(2.0, 2.0, 4, 0.0, true).unwrap()),
        ("back.stl", create_plate(3.0, 3.0, 3, -0.5, true).unwrap()),
    ]);
    let props = ContactSurfaceProperties::new("front.stl").with_variable_thickness("back.stl");
    let mut surface = ContactSurface::new("plate", props, loader);

    surface.rebuild().unwrap();
    assert!(surface.triangle_thicknesses().unwrap().iter().all(|&t| t == 0.001));

    surface.properties_mut().thickness_overflow = OverflowPolicy::Saturate;
    surface.ensure_built().unwrap();
    assert!(surface.triangle_thicknesses().unwrap().iter().all(|&t| t == 0.01));
}

#[test]
fn reverse_window_finds_surface_behind() {
    // Origin below a plate facing up: the surface is behind the query
    // direction, so only a negative window reports it.
    let loader = loader_with(&[("plate.obj", create_plate(2.0, 2.0, 2, 0.0, true).unwrap())]);
    let mut surface = ContactSurface::new("plate", ContactSurfaceProperties::new("plate.obj"), loader);
    surface.rebuild().unwrap();

    let origin = DVec3::new(0.3, -0.2, -0.25);
    assert!(surface.ray_intersect(origin, DVec3::NEG_Z, 0.0, 1.0).is_none());
    let hit = surface.ray_intersect(origin, DVec3::NEG_Z, -1.0, 1.0).unwrap();
    assert_relative_eq!(hit.distance, -0.25, epsilon = 1e-12);
    assert!(surface.ray_intersect(origin, DVec3::NEG_Z, -0.2, 1.0).is_none());
}

#[test]
fn properties_round_trip_through_json() {
    let mut props = ContactSurfaceProperties::new("Geometry/tibia_cartilage.vtp")
        .with_variable_thickness("Geometry/tibia_bone.vtp");
    props.elastic_modulus = MaterialProperty::PerTriangle(vec![1.0e6, 2.0e6]);
    props.scale_factors = DVec3::new(0.001, 0.001, 0.001);
    props.thickness_overflow = OverflowPolicy::Saturate;
    props.ray_traversal = RayTraversal::Exact;

    let json = serde_json::to_string(&props).unwrap();
    assert!(json.contains("\"saturate\""));
    assert!(json.contains("\"exact\""));
    let back: ContactSurfaceProperties = serde_json::from_str(&json).unwrap();
    assert_eq!(back, props);
}

#[test]
fn missing_json_fields_take_defaults() {
    let props: ContactSurfaceProperties =
        serde_json::from_str(r#"{"mesh_file": "femur.stl", "poissons_ratio": 0.45}"#).unwrap();
    assert_eq!(props.mesh_file.to_str(), Some("femur.stl"));
    assert_eq!(props.poissons_ratio, MaterialProperty::Uniform(0.45));
    assert_eq!(props.elastic_modulus, MaterialProperty::Uniform(1.0e6));
    assert_eq!(props.scale_factors, DVec3::ONE);
    assert_eq!(props.thickness_overflow, OverflowPolicy::LegacyMinimum);
    assert_eq!(props.ray_traversal, RayTraversal::Heuristic);
    assert!(props.mesh_back_file.is_none());
}

#[test]
fn degenerate_face_fails_rebuild() {
    let mut mesh = contact_mesh::Mesh::new();
    let a = mesh.add_vertex(DVec3::ZERO);
    let b = mesh.add_vertex(DVec3::X);
    let c = mesh.add_vertex(DVec3::X * 2.0);
    mesh.add_triangle(a, b, c);
    let loader = loader_with(&[("line.stl", mesh)]);
    let mut surface = ContactSurface::new("line", ContactSurfaceProperties::new("line.stl"), loader);
    let err = surface.rebuild().unwrap_err();
    assert!(matches!(
        err,
        ContactMeshError::DegenerateGeometry { triangle: 0, .. }
    ));
}

#[test]
fn forward_hit_inside_window_not_shadowed_by_hit_behind() {
    let mut mesh = contact_mesh::Mesh::new();
    for z in [0.0, 1.0] {
        let a = mesh.add_vertex(DVec3::new(0.0, 0.0, z));
        let b = mesh.add_vertex(DVec3::new(1.0, 0.0, z));
        let c = mesh.add_vertex(DVec3::new(0.0, 1.0, z));
        mesh.add_triangle(a, b, c);
    }
    let loader = loader_with(&[("layers.obj", mesh)]);
    let mut surface =
        ContactSurface::new("layers", ContactSurfaceProperties::new("layers.obj"), loader);
    surface.rebuild().unwrap();

    let origin = DVec3::new(0.2, 0.2, 0.4);
    let hit = surface.ray_intersect(origin, DVec3::Z, 0.0, 10.0).unwrap();
    assert_eq!(hit.triangle, 1);
    assert_relative_eq!(hit.distance, 0.6, epsilon = 1e-12);

    // Window excluding 0.6 but open behind: the reverse cast finds z = 0.
    let behind = surface.ray_intersect(origin, DVec3::Z, -1.0, 0.5).unwrap();
    assert_eq!(behind.triangle, 0);
    assert_relative_eq!(behind.distance, -0.4, epsilon = 1e-12);
}
