use crate::regs::Register;

crate::buffer_def! {
    /// Receive filters.
    RxFilter => {
        /// RXF0
        F0 => Register::RXF0SIDH,
        /// RXF1
        F1 => Register::RXF1SIDH,
        /// RXF2
        F2 => Register::RXF2SIDH,
        /// RXF3
        F3 => Register::RXF3SIDH,
        /// RXF4
        F4 => Register::RXF4SIDH,
        /// RXF5
        F5 => Register::RXF5SIDH
    }
}

crate::buffer_def! {
    /// Receive masks.
    RxMask => {
        /// Mask 0
        Mask0 => Register::RXM0SIDH,
        /// Mask 1
        Mask1 => Register::RXM1SIDH
    }
}
