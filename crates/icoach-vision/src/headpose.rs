//! Head orientation from 2-D facial landmarks.
//!
//! Solves the perspective-n-point problem for five canonical landmark
//! projections (nose tip, outer eye corners, mouth corners) against a fixed
//! approximate 3-D face model, using a pinhole camera derived from the
//! frame dimensions: focal length ~ frame width, principal point at the
//! frame center, no lens distortion.
//!
//! The solve is a Gauss-Newton iteration over an axis-angle rotation plus
//! translation. Non-convergence reports no pose and the frame is dropped.

use nalgebra::{Matrix3, Point2, Point3, SMatrix, SVector, Vector3};

/// Canonical 3-D face model, millimeter-scale approximate coordinates:
/// nose tip, left/right outer eye corner, left/right mouth corner.
pub const FACE_MODEL_POINTS: [[f64; 3]; 5] = [
    [0.0, 0.0, 0.0],
    [-30.0, -30.0, -30.0],
    [30.0, -30.0, -30.0],
    [-20.0, 30.0, -20.0],
    [20.0, 30.0, -20.0],
];

const NUM_POINTS: usize = 5;
const NUM_RESIDUALS: usize = NUM_POINTS * 2;
const NUM_PARAMS: usize = 6;

/// Approximate pinhole intrinsics for a frame.
#[derive(Debug, Clone, Copy)]
pub struct CameraIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl CameraIntrinsics {
    /// Intrinsics derived from the frame dimensions alone: focal length
    /// equal to the frame width, principal point at the frame center.
    pub fn approximate(frame_width: u32, frame_height: u32) -> Self {
        let w = frame_width as f64;
        let h = frame_height as f64;
        Self {
            fx: w,
            fy: w,
            cx: w / 2.0,
            cy: h / 2.0,
        }
    }
}

/// Head rotation angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadPose {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

/// Rodrigues formula: axis-angle vector to rotation matrix.
pub fn rodrigues(rvec: &Vector3<f64>) -> Matrix3<f64> {
    let theta = rvec.norm();
    if theta < 1e-12 {
        return Matrix3::identity();
    }
    let k = rvec / theta;
    let (kx, ky, kz) = (k.x, k.y, k.z);
    let ct = theta.cos();
    let st = theta.sin();
    let vt = 1.0 - ct;
    Matrix3::new(
        ct + kx * kx * vt,
        kx * ky * vt - kz * st,
        kx * kz * vt + ky * st,
        ky * kx * vt + kz * st,
        ct + ky * ky * vt,
        ky * kz * vt - kx * st,
        kz * kx * vt - ky * st,
        kz * ky * vt + kx * st,
        ct + kz * kz * vt,
    )
}

/// Decompose a rotation matrix into yaw/pitch/roll in degrees.
///
/// yaw = atan2(r10, r00), pitch = asin(-r20), roll = atan2(r21, r22),
/// i.e. the ZYX factoring R = Rz(yaw) * Ry(pitch) * Rx(roll).
pub fn rotation_to_ypr(rotation: &Matrix3<f64>) -> HeadPose {
    let yaw = rotation[(1, 0)].atan2(rotation[(0, 0)]);
    let pitch = (-rotation[(2, 0)]).clamp(-1.0, 1.0).asin();
    let roll = rotation[(2, 1)].atan2(rotation[(2, 2)]);
    HeadPose {
        yaw: yaw.to_degrees(),
        pitch: pitch.to_degrees(),
        roll: roll.to_degrees(),
    }
}

/// Project one model point through `[R|t]` and the intrinsics.
///
/// Returns `None` when the point lands behind (or on) the camera plane.
fn project(
    rotation: &Matrix3<f64>,
    translation: &Vector3<f64>,
    intrinsics: &CameraIntrinsics,
    model: &Point3<f64>,
) -> Option<Point2<f64>> {
    let cam = rotation * model.coords + translation;
    if cam.z <= 1e-6 {
        return None;
    }
    Some(Point2::new(
        intrinsics.fx * cam.x / cam.z + intrinsics.cx,
        intrinsics.fy * cam.y / cam.z + intrinsics.cy,
    ))
}

/// Reprojection residuals for one parameter vector `[rx,ry,rz,tx,ty,tz]`.
fn residuals(
    params: &SVector<f64, NUM_PARAMS>,
    image_points: &[Point2<f64>; NUM_POINTS],
    intrinsics: &CameraIntrinsics,
) -> Option<SVector<f64, NUM_RESIDUALS>> {
    let rotation = rodrigues(&Vector3::new(params[0], params[1], params[2]));
    let translation = Vector3::new(params[3], params[4], params[5]);

    let mut out = SVector::<f64, NUM_RESIDUALS>::zeros();
    for (i, model) in FACE_MODEL_POINTS.iter().enumerate() {
        let projected = project(
            &rotation,
            &translation,
            intrinsics,
            &Point3::new(model[0], model[1], model[2]),
        )?;
        out[2 * i] = projected.x - image_points[i].x;
        out[2 * i + 1] = projected.y - image_points[i].y;
    }
    Some(out)
}

/// Initial guess: identity rotation, translation back-projected from the
/// landmark centroid at a depth estimated from the landmark spread.
fn initial_params(
    image_points: &[Point2<f64>; NUM_POINTS],
    intrinsics: &CameraIntrinsics,
) -> SVector<f64, NUM_PARAMS> {
    let mean_u = image_points.iter().map(|p| p.x).sum::<f64>() / NUM_POINTS as f64;
    let mean_v = image_points.iter().map(|p| p.y).sum::<f64>() / NUM_POINTS as f64;

    let min_u = image_points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let max_u = image_points
        .iter()
        .map(|p| p.x)
        .fold(f64::NEG_INFINITY, f64::max);
    let span = (max_u - min_u).max(1.0);

    // Model eye corners are 60 units apart; match that against the observed
    // horizontal spread to seed the depth.
    let z0 = (intrinsics.fx * 60.0 / span).clamp(10.0, 1e5);
    let tx = (mean_u - intrinsics.cx) / intrinsics.fx * z0;
    let ty = (mean_v - intrinsics.cy) / intrinsics.fy * z0;

    SVector::<f64, NUM_PARAMS>::from_column_slice(&[0.0, 0.0, 0.0, tx, ty, z0])
}

/// Solve head pose from the five canonical 2-D landmark projections.
///
/// Returns `None` when the iteration diverges, hits a degenerate geometry
/// or fails to converge within `max_iterations`.
pub fn solve_head_pose(
    image_points: &[Point2<f64>; NUM_POINTS],
    intrinsics: &CameraIntrinsics,
    max_iterations: usize,
    convergence_eps: f64,
) -> Option<HeadPose> {
    let mut params = initial_params(image_points, intrinsics);
    let mut converged = false;

    for _ in 0..max_iterations {
        let base = residuals(&params, image_points, intrinsics)?;

        // Numeric Jacobian, forward differences.
        let mut jacobian = SMatrix::<f64, NUM_RESIDUALS, NUM_PARAMS>::zeros();
        for j in 0..NUM_PARAMS {
            let delta = 1e-6 * params[j].abs().max(1.0);
            let mut nudged = params;
            nudged[j] += delta;
            let shifted = residuals(&nudged, image_points, intrinsics)?;
            for i in 0..NUM_RESIDUALS {
                jacobian[(i, j)] = (shifted[i] - base[i]) / delta;
            }
        }

        let jt = jacobian.transpose();
        // Small damping keeps the normal equations solvable near-degenerate.
        let hessian = jt * jacobian + SMatrix::<f64, NUM_PARAMS, NUM_PARAMS>::identity() * 1e-9;
        let gradient = jt * base;

        let step = hessian.cholesky()?.solve(&gradient);
        params -= step;

        if !params.iter().all(|v| v.is_finite()) {
            return None;
        }

        if step.norm() < convergence_eps * params.norm().max(1.0) {
            converged = true;
            break;
        }
    }

    if !converged {
        return None;
    }

    let rotation = rodrigues(&Vector3::new(params[0], params[1], params[2]));
    Some(rotation_to_ypr(&rotation))
}
