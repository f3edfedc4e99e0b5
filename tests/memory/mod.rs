mod memory_bounds_test;
