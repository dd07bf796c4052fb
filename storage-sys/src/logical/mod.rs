pub mod lvm_tools;
