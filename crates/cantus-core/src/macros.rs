//! Node authoring and graph building macros.
//!
//! - `pins!` - Generate the pin enumeration methods of a [`Node`](crate::Node)
//! - `chain!` - Connect nodes in series

/// Implements `input_count`, `input_mut`, `output_count`, `output` and
/// `output_mut` for a node whose pins are direct fields.
///
/// Pin indices follow the order the fields are listed in.
///
/// # Example
/// ```
/// use cantus_core::{pins, InputPin, Node, OutputPin, ProcessContext};
///
/// struct Invert {
///     input: InputPin,
///     output: OutputPin,
/// }
///
/// impl Node for Invert {
///     fn process(&mut self, ctx: &mut ProcessContext<'_>) {
///         let input = self.input.pull(ctx);
///         for (out, x) in self.output.buffer_mut().iter_mut().zip(input) {
///             *out = -x;
///         }
///     }
///
///     pins!(inputs: [input], outputs: [output]);
/// }
/// ```
#[macro_export]
macro_rules! pins {
    (inputs: [$($input:ident),* $(,)?], outputs: [$($output:ident),* $(,)?] $(,)?) => {
        fn input_count(&self) -> usize {
            $crate::pins!(@count $($input)*)
        }

        fn input_mut(&mut self, index: usize) -> Option<&mut $crate::InputPin> {
            $crate::node::nth_pin_mut([$(&mut self.$input),*], index)
        }

        fn output_count(&self) -> usize {
            $crate::pins!(@count $($output)*)
        }

        fn output(&self, index: usize) -> Option<&$crate::OutputPin> {
            $crate::node::nth_pin([$(&self.$output),*], index)
        }

        fn output_mut(&mut self, index: usize) -> Option<&mut $crate::OutputPin> {
            $crate::node::nth_pin_mut([$(&mut self.$output),*], index)
        }
    };

    (@count) => { 0usize };
    (@count $head:ident $($tail:ident)*) => {
        1usize + $crate::pins!(@count $($tail)*)
    };
}

/// Connects output 0 of each node to input 0 of the next.
///
/// Evaluates to the first connection error, if any.
///
/// # Example
/// ```ignore
/// chain!(manager, osc, filter, gain)?;
/// ```
#[macro_export]
macro_rules! chain {
    ($manager:expr, $first:expr, $second:expr $(,)?) => {
        $manager.connect($first.output(0), $second, 0)
    };

    ($manager:expr, $first:expr, $second:expr, $($rest:expr),+ $(,)?) => {
        match $manager.connect($first.output(0), $second, 0) {
            Ok(()) => $crate::chain!($manager, $second, $($rest),+),
            Err(e) => Err(e),
        }
    };
}
