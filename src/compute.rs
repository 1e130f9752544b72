/// Workgroup size for `compute.wgsl#mandelbrot`.
pub const MANDELBROT_WORKGROUP_SIZE_Y: u32 = 64;

/// Corresponds to `compute.wgsl#MANDELBROT_DISPATCH_SIZE_Y`.
pub const MANDELBROT_DISPATCH_SIZE_Y: u32 = 1024;

/// Pixels covered by one step of the dispatch's `x` dimension.
pub const PIXELS_PER_DISPATCH_X: usize =
    (MANDELBROT_DISPATCH_SIZE_Y * MANDELBROT_WORKGROUP_SIZE_Y) as usize;

/**
Dispatch size for `compute.wgsl#mandelbrot`, which runs one invocation per pixel.

A single dispatch dimension is capped at 65535 workgroups
([maxComputeWorkgroupsPerDimension](https://www.w3.org/TR/webgpu/#dom-supported-limits-maxcomputeworkgroupsperdimension)),
which an 800x600 grid already exceeds. The work is therefore laid out in two
dimensions: `y` is fixed at `1024` workgroups of `(1, 64, 1)` invocations, i.e.
`65536` pixels, and `x` counts how many such columns are needed.

The shader recovers the pixel index as
`global_invocation_id.x * 65536 + global_invocation_id.y` and discards
invocations past the end of the grid.
*/
pub fn mandelbrot_dispatch_size(total_work: usize) -> (u32, u32, u32) {
    let x = total_work.div_ceil(PIXELS_PER_DISPATCH_X).max(1) as u32;
    (x, MANDELBROT_DISPATCH_SIZE_Y, 1)
}
