/// Distinguishes a cold boot from the console's reset button.
///
/// Passed to the cartridge `init` hook and to every component reset so that
/// state which survives the reset button (work RAM, save RAM, nametables)
/// is only cleared on power-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResetKind {
    PowerOn,
    Soft,
}
