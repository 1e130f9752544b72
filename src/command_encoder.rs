/// Record commands with `function` and finish them into a submittable buffer.
pub fn encode(
    device: &wgpu::Device,
    label: &str,
    function: impl FnOnce(&mut wgpu::CommandEncoder),
) -> wgpu::CommandBuffer {
    let mut command_encoder =
        device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
    function(&mut command_encoder);
    command_encoder.finish()
}

/// Scoped passes: the pass is ended when `function` returns.
pub trait CommandEncoderExt {
    fn with_compute_pass<'pass, A>(
        &'pass mut self,
        label: &str,
        function: impl FnOnce(&mut wgpu::ComputePass<'pass>) -> A,
    ) -> A;

    fn with_render_pass<'pass, A>(
        &'pass mut self,
        descriptor: &wgpu::RenderPassDescriptor<'pass, '_>,
        function: impl FnOnce(&mut wgpu::RenderPass<'pass>) -> A,
    ) -> A;
}

impl CommandEncoderExt for wgpu::CommandEncoder {
    fn with_compute_pass<'pass, A>(
        &'pass mut self,
        label: &str,
        function: impl FnOnce(&mut wgpu::ComputePass<'pass>) -> A,
    ) -> A {
        let mut compute_pass =
            self.begin_compute_pass(&wgpu::ComputePassDescriptor { label: Some(label) });
        function(&mut compute_pass)
    }

    fn with_render_pass<'pass, A>(
        &'pass mut self,
        descriptor: &wgpu::RenderPassDescriptor<'pass, '_>,
        function: impl FnOnce(&mut wgpu::RenderPass<'pass>) -> A,
    ) -> A {
        let mut render_pass = self.begin_render_pass(descriptor);
        function(&mut render_pass)
    }
}
